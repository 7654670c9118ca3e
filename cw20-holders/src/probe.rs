//! Reachability check run before any real work.

use crate::error::Result;
use crate::lcd::Lcd;
use crate::types::ChainStatus;

/// Confirm the node answers by fetching its latest block header.
///
/// Logs the height and block time on success and the error on failure.
///
/// # Errors
///
/// Returns the transport, status or decode error of the block request.
pub async fn check_connection<L: Lcd>(lcd: &L) -> Result<ChainStatus> {
    tracing::info!("checking connection to the chain");
    match lcd.latest_block().await {
        Ok(status) => {
            tracing::info!(
                chain_id = %status.chain_id,
                height = status.height,
                time = %status.time,
                "connected"
            );
            Ok(status)
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot reach the chain");
            Err(e)
        }
    }
}
