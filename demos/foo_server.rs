//! A small server demonstrating convention-driven registration.
//!
//! ```text
//! curl localhost:8081/api/v1/foos
//! curl -X PUT -d '{"name":"Eamon"}' localhost:8081/eamon/update/foo
//! curl -X POST -d '{"name":"Courtney"}' localhost:8081/foo
//! curl localhost:8081/api/v1/user/42
//! curl localhost:8081/schemas
//! ```

use autoroute::{Body, Context, Engine, EngineOptions, HandlerOptions, HttpError, HttpServer, Payload, ServerConfig};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Foo {
    name: String,
}

impl Payload for Foo {}

#[derive(Debug, Serialize)]
pub struct User {
    id: u64,
}

impl Payload for User {}

mod foo {
    use std::sync::Arc;

    use autoroute::{Context, HandlerOptions, HttpError, Operations};

    use super::Foo;

    /// Registered in bulk; its operations land under `/foo`.
    pub struct Server;

    impl autoroute::Server for Server {
        fn operations(self: Arc<Self>, ops: &mut Operations) {
            ops.instantiator("Update", || {
                (
                    Some(HandlerOptions::new().path("/eamon/update/foo")),
                    |_ctx: Context, foo: Foo| async move { Ok::<_, HttpError>(foo) },
                )
            })
            .handler("Create", |_ctx: Context, foo: Foo| async move { Ok::<_, HttpError>(foo) });
        }
    }
}

async fn list_foos(_ctx: Context, _body: ()) -> Result<Vec<Foo>, HttpError> {
    Ok(vec![
        Foo {
            name: "Eamon".to_string(),
        },
        Foo {
            name: "Courtney".to_string(),
        },
    ])
}

async fn get_user(_ctx: Context, _body: (), id: String) -> Result<User, HttpError> {
    let id = id
        .parse()
        .map_err(|_| HttpError::bad_request(format!("invalid user id: {id}")))?;
    Ok(User { id })
}

fn log_request(ctx: Context, body: Body, params: Vec<String>) -> (Context, Body, Vec<String>) {
    info!("calling log request middleware: {:?}", body.to_json());
    (ctx, body, params)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let mut engine = Engine::with_options(EngineOptions::new().package("foo_server").schema_path("/schemas"));
    engine.register_middleware("/api/v1/foos", log_request);
    engine.register_handler(list_foos, Some(HandlerOptions::new().prefix("/api/v1")));
    engine.register_handler(get_user, Some(HandlerOptions::new().prefix("/api/v1")));
    engine.register_server(foo::Server, None);

    let config = ServerConfig {
        addr: "127.0.0.1:8081".parse()?,
        ..ServerConfig::default()
    };

    info!("Starting server on http://{}", config.addr);
    HttpServer::new(config, engine.dispatcher()).start().await?;

    Ok(())
}
