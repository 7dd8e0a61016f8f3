use std::future::{ready, Ready};
use std::io::Write;
use std::time::Instant;

use actix_web::{
   dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
   Error,
};
use colored::{ColoredString, Colorize};
use env_logger::{Builder, Env};
use futures_util::future::LocalBoxFuture;
use log::{info, warn, Level};

pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type InitError = ();
   type Transform = LoggerMiddlewareService<S>;
   type Future = Ready<Result<Self::Transform, Self::InitError>>;

   fn new_transform(&self, service: S) -> Self::Future {
      ready(Ok(LoggerMiddlewareService { service }))
   }
}

pub struct LoggerMiddlewareService<S> {
   service: S,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

   forward_ready!(service);

   fn call(&self, req: ServiceRequest) -> Self::Future {
      let started = Instant::now();
      let line = format!("{} {}", req.method(), req.path());
      let fut = self.service.call(req);

      Box::pin(async move {
         match fut.await {
            Ok(res) => {
               let status = res.status();
               if status.is_server_error() {
                  warn!("{} -> {} ({:?})", line, status, started.elapsed());
               } else {
                  info!("{} -> {} ({:?})", line, status, started.elapsed());
               }
               Ok(res)
            }
            Err(err) => {
               info!("{} -> {} ({:?})", line, err.as_response_error().status_code(), started.elapsed());
               Err(err)
            }
         }
      })
   }
}

fn paint(level: Level) -> ColoredString {
   let name = level.as_str();
   match level {
      Level::Error => name.red().bold(),
      Level::Warn => name.yellow().bold(),
      Level::Info => name.green().bold(),
      Level::Debug => name.blue().bold(),
      Level::Trace => name.magenta().bold(),
   }
}

/// Installs the global logger. The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logger() {
   Builder::from_env(Env::default().default_filter_or("info"))
      .format(|buf, record| {
         writeln!(
            buf,
            "{} {} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            paint(record.level()),
            record.target().dimmed(),
            record.args()
         )
      })
      .init()
}
