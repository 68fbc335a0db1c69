//! A minimal loopback RESP server for end-to-end tests: accepts one
//! connection over a UNIX-domain socket, echoes back scripted replies for
//! whatever commands arrive, and shuts down once the socket is dropped.
//!
//! This only understands enough RESP to read one multi-bulk request at a
//! time; it does not implement real Redis semantics. Each test supplies the
//! exact reply bytes to send back, in order, one per request.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::thread::JoinHandle;

pub struct MockServer {
    pub socket_path: PathBuf,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Starts a server that replies with each entry in `replies`, in order,
    /// one per request it reads off the wire. Raw RESP bytes -- include your
    /// own `\r\n`.
    pub fn start(replies: Vec<&'static [u8]>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket_path = dir.path().join("redisync-test.sock");
        let listener = UnixListener::bind(&socket_path).expect("bind mock server socket");
        // Keep the tempdir alive for the life of the server thread by leaking
        // it -- test processes are short-lived and this avoids plumbing the
        // TempDir handle through the thread boundary.
        std::mem::forget(dir);

        let path_for_thread = socket_path.clone();
        let handle = std::thread::spawn(move || {
            let (stream, _) = match listener.accept() {
                Ok(pair) => pair,
                Err(_) => return,
            };
            serve(stream, replies);
            let _ = std::fs::remove_file(&path_for_thread);
        });

        Self {
            socket_path,
            handle: Some(handle),
        }
    }

    pub fn connect(&self) -> UnixStream {
        UnixStream::connect(&self.socket_path).expect("connect to mock server")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(stream: UnixStream, replies: Vec<&'static [u8]>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut writer = stream;
    for reply in replies {
        if read_one_request(&mut reader).is_none() {
            break;
        }
        if writer.write_all(reply).is_err() {
            break;
        }
    }
}

/// Reads exactly one multi-bulk request (`*N\r\n$len\r\n...`) and discards it.
fn read_one_request(reader: &mut BufReader<UnixStream>) -> Option<()> {
    let mut header = String::new();
    if reader.read_line(&mut header).ok()? == 0 {
        return None;
    }
    let count: usize = header.trim().trim_start_matches('*').parse().ok()?;
    for _ in 0..count {
        let mut len_line = String::new();
        reader.read_line(&mut len_line).ok()?;
        let len: usize = len_line.trim().trim_start_matches('$').parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        std::io::Read::read_exact(reader, &mut buf).ok()?;
    }
    Some(())
}
