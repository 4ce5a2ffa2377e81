use log::{debug, info, warn};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;

use crate::error::DialError;
use crate::history::Direction;
use crate::node::NodeContext;
use crate::peer::{PeerAddress, PeerConnection, PeerStreamReader, PeerWriter};
use crate::protocol::wire::format_hello;

/// Opens an outbound connection to `address`.
///
/// Hostnames are resolved first, so `localhost:5000` and `127.0.0.1:5000`
/// name the same peer. Either the peer ends up registered, greeted and read
/// from, or the registry is left exactly as it was. An address that is
/// already registered is reported without connecting.
pub async fn dial(
    ctx: &NodeContext,
    address: PeerAddress,
    connect_timeout: Duration,
) -> Result<Arc<PeerConnection>, DialError> {
    if ctx.shutdown.is_cancelled() {
        return Err(DialError::ShuttingDown);
    }

    let resolved = timeout(connect_timeout, resolve(&address)).await;
    let address = match resolved {
        Ok(resolved) => resolved?,
        Err(_) => {
            warn!("Resolving {} timed out", address);
            return Err(DialError::Timeout(address, connect_timeout));
        }
    };

    if ctx.registry.get(&address).await.is_some() {
        info!("Already connected to {}", address);
        return Err(DialError::AlreadyConnected(address));
    }

    info!("Connecting to {}...", address);
    let stream = match timeout(
        connect_timeout,
        TcpStream::connect((address.host(), address.port())),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            warn!("Failed to connect to {}: {}", address, e);
            return Err(DialError::ConnectFailed(address, e));
        }
        Err(_) => {
            warn!("Connecting to {} timed out", address);
            return Err(DialError::Timeout(address, connect_timeout));
        }
    };

    let (read_half, write_half) = stream.into_split();
    let connection =
        establish(ctx, address, Box::new(read_half), Box::new(write_half)).await?;

    info!("Connected to {}", connection.address());
    Ok(connection)
}

/// Maps a hostname to the IP address connections are registered under.
///
/// IPv4 results are preferred, matching what `accept` reports for peers
/// reached over IPv4.
async fn resolve(address: &PeerAddress) -> Result<PeerAddress, DialError> {
    if address.host().parse::<IpAddr>().is_ok() {
        return Ok(address.clone());
    }

    let candidates: Vec<SocketAddr> = lookup_host((address.host(), address.port()))
        .await
        .map_err(|e| DialError::ResolveFailed(address.clone(), e))?
        .collect();

    match candidates
        .iter()
        .find(|candidate| candidate.is_ipv4())
        .or(candidates.first())
    {
        Some(resolved) => {
            debug!("Resolved {} to {}", address, resolved);
            Ok(PeerAddress::from(*resolved))
        }
        None => Err(DialError::ResolveFailed(
            address.clone(),
            io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        )),
    }
}

/// Registers a freshly connected stream, greets the peer and starts its
/// reader.
///
/// Rolls back the registration if the hello line cannot be written.
async fn establish(
    ctx: &NodeContext,
    address: PeerAddress,
    reader: PeerStreamReader,
    writer: PeerWriter,
) -> Result<Arc<PeerConnection>, DialError> {
    let connection = Arc::new(PeerConnection::new(
        address.clone(),
        writer,
        ctx.shutdown.child_token(),
    ));

    // A concurrent dial or accept may have won the race since the check in `dial`
    ctx.registry
        .register(address.clone(), connection.clone())
        .await?;
    connection.mark_online();

    if let Err(e) = connection
        .send_line_within(&format_hello(&ctx.username), ctx.write_timeout)
        .await
    {
        warn!("Failed to send hello to {}: {}", address, e);
        ctx.registry.unregister(&address).await;
        connection.close();
        connection.mark_closed();
        return Err(DialError::HelloFailed(address, e));
    }

    ctx.record(Direction::Sent, format!("Connected to {}", address))
        .await;
    ctx.spawn_reader(connection.clone(), reader);
    Ok(connection)
}
