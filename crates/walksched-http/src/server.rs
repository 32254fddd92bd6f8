//! HTTP server lifecycle

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use walksched_core::Scheduler;

use crate::{HttpResult, router};

/// Bound HTTP server, ready to accept requests
pub struct HttpServer {
    listener: TcpListener,
    scheduler: Arc<Scheduler>,
}

impl HttpServer {
    /// Bind the listen address
    pub async fn bind(addr: SocketAddr, scheduler: Arc<Scheduler>) -> HttpResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "HTTP server listening");
        Ok(Self {
            listener,
            scheduler,
        })
    }

    /// Actual bound address (useful when binding port 0)
    pub fn local_addr(&self) -> HttpResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests
    pub async fn run<F>(self, shutdown: F) -> HttpResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.scheduler);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
