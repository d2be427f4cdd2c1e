//! Async byte transport behind one duplicated descriptor.
//!
//! Sockets are registered with the Tokio reactor so an idle peer costs
//! nothing. Files and pipes cannot be polled for readiness and go through
//! `tokio::fs::File`, which runs each read and write on the blocking pool.

use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::fs::FileTypeExt;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};

use crate::net::endpoint::{socket_domain, SocketDomain};

#[derive(Debug)]
pub enum Transport {
    Tcp(TcpStream),
    Unix(UnixStream),
    File(tokio::fs::File),
}

impl Transport {
    /// Duplicate `fd` and pick the driver that fits it.
    ///
    /// Must be called from within a Tokio runtime: sockets are switched to
    /// non-blocking mode and registered with the current reactor. The flag is
    /// shared with every other copy of the descriptor.
    pub fn duplicate(fd: BorrowedFd<'_>) -> io::Result<Self> {
        let owned = fd.try_clone_to_owned()?;
        Self::from_owned(owned)
    }

    fn from_owned(owned: OwnedFd) -> io::Result<Self> {
        let file = std::fs::File::from(owned);
        if !file.metadata()?.file_type().is_socket() {
            return Ok(Transport::File(tokio::fs::File::from_std(file)));
        }

        let owned = OwnedFd::from(file);
        match socket_domain(owned.as_fd()) {
            SocketDomain::Inet => {
                let stream = std::net::TcpStream::from(owned);
                stream.set_nonblocking(true)?;
                Ok(Transport::Tcp(TcpStream::from_std(stream)?))
            }
            SocketDomain::Local => {
                let stream = std::os::unix::net::UnixStream::from(owned);
                stream.set_nonblocking(true)?;
                Ok(Transport::Unix(UnixStream::from_std(stream)?))
            }
        }
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::File(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::File(file) => Pin::new(file).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Transport::Unix(stream) => Pin::new(stream).poll_flush(cx),
            Transport::File(file) => Pin::new(file).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::File(file) => Pin::new(file).poll_shutdown(cx),
        }
    }
}

impl From<tokio::fs::File> for Transport {
    fn from(file: tokio::fs::File) -> Self {
        Transport::File(file)
    }
}
