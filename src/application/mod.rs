pub mod routes;
pub mod views;

use crate::{
    configuration::{Configuration, RepositoryKind},
    repository::mem::InMemoryMemberRepository,
};
use anyhow::{Context, Result};
use routes::SharedRepository;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tracing::{info, instrument};
use warp::{filters::BoxedFilter, reply::Response, Filter, Reply};

fn get_repository_by_conf(kind: RepositoryKind) -> SharedRepository {
    match kind {
        RepositoryKind::Mem => Arc::from(InMemoryMemberRepository::new()),
    }
}

pub struct Application {
    addr: SocketAddr,
    repository: SharedRepository,
    compression: bool,
}

impl Application {
    pub fn build(config: Configuration) -> Result<Application> {
        let addr = SocketAddr::from_str(&format!("{}:{}", config.app.host, config.app.port))
            .with_context(|| {
                format!(
                    "can't parse host and port: {}:{}",
                    config.app.host, config.app.port
                )
            })?;
        let kind = config.repository.unwrap_or_default();
        info!(repository = ?kind, addr = %addr, "building application");

        Ok(Application {
            addr,
            repository: get_repository_by_conf(kind),
            compression: config.compression.unwrap_or(false),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn repository(&self) -> SharedRepository {
        self.repository.clone()
    }

    /// All routes, gzip-compressed when the configuration asks for it.
    pub fn filter(&self) -> BoxedFilter<(Response,)> {
        let f = routes::routes(self.repository.clone());
        if self.compression {
            f.with(warp::filters::compression::gzip())
                .map(|r| Reply::into_response(r))
                .boxed()
        } else {
            f.map(|r| Reply::into_response(r)).boxed()
        }
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    pub async fn run(self) {
        let f = self.filter();

        info!(compression = self.compression, "listening");
        warp::serve(f).run(self.addr).await
    }
}
