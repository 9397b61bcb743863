use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use pngbin::range::{HttpRangeFetcher, RangeFetchConfig, RangeFetcher};

/// A minimal HTTP/1.1 server answering exactly one ranged GET request per
/// connection with a canned response. No mocking crate exists in the
/// retrieved example pack for this, so a raw listener thread speaking just
/// enough of the protocol is the smallest faithful substitute.
fn spawn_stub(body: &'static [u8], status_line: &'static str, content_type: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);

            let response = format!(
                "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(body);
        }
    });

    format!("http://{addr}/slot.png")
}

#[test]
fn fetches_valid_range_response() {
    let body = b"0123456789";
    let url = spawn_stub(body, "HTTP/1.1 206 Partial Content", "image/png");

    let fetcher = HttpRangeFetcher::with_config(RangeFetchConfig {
        max_attempts: 1,
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let got = fetcher.fetch_range(&url, 0, 9).unwrap();
    assert_eq!(got, body);
}

#[test]
fn rejects_non_206_status() {
    let body = b"whole file, not a range";
    let url = spawn_stub(body, "HTTP/1.1 200 OK", "image/png");

    let fetcher = HttpRangeFetcher::with_config(RangeFetchConfig {
        max_attempts: 1,
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let err = fetcher.fetch_range(&url, 0, 9).unwrap_err();
    assert!(matches!(err, pngbin::PngBinError::NetRead(_)));
}

#[test]
fn rejects_wrong_content_type() {
    let body = b"0123456789";
    let url = spawn_stub(body, "HTTP/1.1 206 Partial Content", "application/octet-stream");

    let fetcher = HttpRangeFetcher::with_config(RangeFetchConfig {
        max_attempts: 1,
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let err = fetcher.fetch_range(&url, 0, 9).unwrap_err();
    assert!(matches!(err, pngbin::PngBinError::NetRead(_)));
}
