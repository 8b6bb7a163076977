//! Blocking HTTP plumbing for dataset downloads.

use std::io::{self, Read, Write};
use std::sync::OnceLock;
use std::time::Duration;

/// Shared agent: 10s to connect, 30s per read or write.
pub(crate) fn agent() -> &'static ureq::Agent {
    static SHARED: OnceLock<ureq::Agent> = OnceLock::new();
    SHARED.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .user_agent(concat!("penguin-predictor/", env!("CARGO_PKG_VERSION")))
            .build()
    })
}

/// Copy the body of `response` into `writer`, returning the byte count.
///
/// Bodies larger than `max_bytes` fail with `InvalidData`, either up front from
/// the declared `Content-Length` or once the stream passes the cap.
pub(crate) fn copy_response_to_writer(
    response: ureq::Response,
    writer: &mut impl Write,
    max_bytes: usize,
) -> io::Result<u64> {
    let cap = max_bytes as u64;
    let declared = response
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<u64>().ok());
    if let Some(length) = declared.filter(|length| *length > cap) {
        return Err(too_large(length, cap));
    }

    let mut capped = response.into_reader().take(cap + 1);
    io::copy(&mut capped, &mut CapWriter { inner: writer, room: cap })
}

fn too_large(seen: u64, cap: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("response body of {seen} bytes exceeds the {cap} byte limit"),
    )
}

/// Forwards writes until `room` runs out, then rejects the overflow.
struct CapWriter<'a, W> {
    inner: &'a mut W,
    room: u64,
}

impl<W: Write> Write for CapWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() as u64 > self.room {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "response body exceeds the download limit",
            ));
        }
        let written = self.inner.write(buf)?;
        self.room -= written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answer a single request on a loopback port with `reply`; returns the base URL.
    pub(crate) fn serve_once(reply: String) -> String {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        std::thread::spawn(move || {
            let Ok((mut conn, _)) = listener.accept() else {
                return;
            };
            let mut request = vec![0u8; 2048];
            let _ = conn.read(&mut request);
            let _ = conn.write_all(reply.as_bytes());
        });
        url
    }
}
