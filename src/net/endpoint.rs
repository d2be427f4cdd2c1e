//! Transport endpoints and address resolution.
//!
//! # Responsibilities
//! - Own the input/output descriptors of one accepted connection
//! - Resolve local and peer addresses into [`EndpointAddress`]
//! - Tell sockets apart from files and pipes
//!
//! # Design Decisions
//! - `ENOTSOCK` from `getsockname` is the only signal that a descriptor is
//!   not networked; every other lookup failure is an error
//! - Resolution reads the input descriptor, the same one an inetd-style
//!   server receives on stdin

use std::fs::File;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::socket::{self, getpeername, getsockname, SockaddrStorage};
use thiserror::Error;

/// Network identity of one side of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointAddress {
    /// The descriptor is a file, pipe or terminal.
    NotNetworked,
    /// An IPv4 socket address.
    Ipv4(Ipv4Addr),
    /// A socket of any other family (IPv6, Unix domain, ...).
    OtherFamily,
}

impl EndpointAddress {
    fn from_storage(addr: &SockaddrStorage) -> Self {
        match addr.as_sockaddr_in() {
            Some(sin) => Self::Ipv4(*SocketAddrV4::from(*sin).ip()),
            None => Self::OtherFamily,
        }
    }
}

/// Address lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unable to resolve local address: {0}")]
    Local(Errno),

    #[error("unable to resolve peer address: {0}")]
    Peer(Errno),
}

/// Anything that can report the two addresses of a connection.
pub trait AddressSource {
    /// Address bound on our side. Non-socket transports yield
    /// [`EndpointAddress::NotNetworked`].
    fn local_address(&self) -> Result<EndpointAddress, ResolveError>;

    /// Address of the remote side.
    fn peer_address(&self) -> Result<EndpointAddress, ResolveError>;
}

impl AddressSource for BorrowedFd<'_> {
    fn local_address(&self) -> Result<EndpointAddress, ResolveError> {
        match getsockname::<SockaddrStorage>(self.as_raw_fd()) {
            Ok(addr) => Ok(EndpointAddress::from_storage(&addr)),
            Err(Errno::ENOTSOCK) => Ok(EndpointAddress::NotNetworked),
            Err(errno) => Err(ResolveError::Local(errno)),
        }
    }

    fn peer_address(&self) -> Result<EndpointAddress, ResolveError> {
        getpeername::<SockaddrStorage>(self.as_raw_fd())
            .map(|addr| EndpointAddress::from_storage(&addr))
            .map_err(ResolveError::Peer)
    }
}

/// Address family of a descriptor already known to be a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SocketDomain {
    /// IPv4 or IPv6.
    Inet,
    /// Unix domain, or anything `getsockname` cannot describe.
    Local,
}

pub(crate) fn socket_domain(fd: BorrowedFd<'_>) -> SocketDomain {
    match getsockname::<SockaddrStorage>(fd.as_raw_fd()) {
        Ok(addr) if addr.as_sockaddr_in().is_some() || addr.as_sockaddr_in6().is_some() => {
            SocketDomain::Inet
        }
        _ => SocketDomain::Local,
    }
}

/// The byte-stream connection handed to the gate.
///
/// Holds separate input and output descriptors so that stdio (two fds) and
/// sockets (one fd, duplicated) look the same to the rest of the crate.
#[derive(Debug)]
pub struct TransportEndpoint {
    input: OwnedFd,
    output: OwnedFd,
}

impl TransportEndpoint {
    pub fn new(input: OwnedFd, output: OwnedFd) -> Self {
        Self { input, output }
    }

    /// Use one descriptor for both directions.
    pub fn from_fd(fd: OwnedFd) -> io::Result<Self> {
        let output = fd.try_clone()?;
        Ok(Self::new(fd, output))
    }

    /// Wrap an accepted TCP connection.
    pub fn from_tcp(stream: TcpStream) -> io::Result<Self> {
        Self::from_fd(stream.into())
    }

    /// Degraded mode: replay or capture through a plain file.
    pub fn from_file(file: File) -> io::Result<Self> {
        Self::from_fd(file.into())
    }

    /// The connection inherited on stdin/stdout (inetd style).
    pub fn stdio() -> io::Result<Self> {
        let input = io::stdin().as_fd().try_clone_to_owned()?;
        let output = io::stdout().as_fd().try_clone_to_owned()?;
        Ok(Self::new(input, output))
    }

    pub fn input(&self) -> BorrowedFd<'_> {
        self.input.as_fd()
    }

    pub fn output(&self) -> BorrowedFd<'_> {
        self.output.as_fd()
    }

    /// Shut down both directions of a socket transport so that pending
    /// reads on every duplicate return. A no-op for files and pipes.
    pub fn shutdown(&self) -> io::Result<()> {
        for fd in [self.input(), self.output()] {
            match socket::shutdown(fd.as_raw_fd(), socket::Shutdown::Both) {
                Ok(()) | Err(Errno::ENOTSOCK) | Err(Errno::ENOTCONN) => {}
                Err(errno) => return Err(errno.into()),
            }
        }
        Ok(())
    }
}

impl AddressSource for TransportEndpoint {
    fn local_address(&self) -> Result<EndpointAddress, ResolveError> {
        self.input().local_address()
    }

    fn peer_address(&self) -> Result<EndpointAddress, ResolveError> {
        self.input().peer_address()
    }
}
