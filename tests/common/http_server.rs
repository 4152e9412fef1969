//! Minimal HTTP/1.1 server for fetcher tests.
//!
//! Serves one canned response to every request on a background thread.

use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
    time::Duration,
};

#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the full body.
    Body(Vec<u8>),
    NotFound,
    /// Declares `declared` bytes, sends `body`, then hangs up.
    Truncated { declared: usize, body: Vec<u8> },
    /// Reads the request and never answers.
    Stall,
}

/// Starts a server and returns its base URL, e.g. `http://127.0.0.1:12345`.
pub fn start(reply: Reply) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let reply = Arc::new(reply);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let reply = Arc::clone(&reply);
            thread::spawn(move || handle(stream, &reply));
        }
    });
    format!("http://127.0.0.1:{port}")
}

/// A URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn handle(mut stream: TcpStream, reply: &Reply) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let head_only = buf[..n].starts_with(b"HEAD ");
    if let Reply::Stall = reply {
        thread::sleep(Duration::from_secs(10));
        return;
    }

    let (status, declared, body): (&str, usize, &[u8]) = match reply {
        Reply::Body(body) => ("200 OK", body.len(), body.as_slice()),
        Reply::NotFound => ("404 Not Found", 0, &[][..]),
        Reply::Truncated { declared, body } => ("200 OK", *declared, body.as_slice()),
        Reply::Stall => return,
    };
    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {declared}\r\nContent-Type: font/woff2\r\nConnection: close\r\n\r\n"
    );
    let _ = stream.write_all(header.as_bytes());
    if !head_only {
        let _ = stream.write_all(body);
    }
    let _ = stream.flush();
}
