/*!
JSON-lines method channel in front of the facade
*/

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::core::{
    error::FacadeError,
    facade::{MethodCall, MethodResponse, NotificationFacade},
};

/// Answer one request line
pub async fn respond(facade: &NotificationFacade, line: &str) -> MethodResponse {
    match serde_json::from_str::<MethodCall>(line) {
        Ok(call) => facade.handle_method_call(&call).await.into(),
        Err(e) => {
            warn!("Rejecting malformed request: {}", e);
            Err(FacadeError::InvalidArgument(format!("malformed request: {}", e))).into()
        }
    }
}

/// Read one request per line and write one response per line until the
/// reader is exhausted. A line that is not UTF-8 is answered, not fatal.
pub async fn serve<R, W>(facade: &NotificationFacade, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                respond(facade, line).await
            }
            Err(e) => {
                warn!("Rejecting request that is not UTF-8: {}", e);
                Err(FacadeError::InvalidArgument(format!("request is not UTF-8: {}", e))).into()
            }
        };

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    info!("Command channel closed");
    Ok(())
}
