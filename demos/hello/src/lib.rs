//! The smallest app: fixed pages and a greeting with a URL variable.

use lantern::{App, Req, escape};

/// Text printed by the `hello` subcommand.
pub const HELLO_MESSAGE: &str = "Hello, Human!";

/// Build the app.
pub fn app() -> App {
    let mut app = App::new();
    app.get("/", index);
    app.get("/hi", say_hello);
    app.get("/hello", say_hello);
    app.get("/greet", greet);
    app.get("/greet/{name}", greet);
    app
}

async fn index(_req: Req) -> &'static str {
    "<h1>Hello, World!</h1>"
}

async fn say_hello(_req: Req) -> &'static str {
    "<h1>Hello, Lantern!</h1>"
}

async fn greet(req: Req) -> String {
    let name = req.param("name").unwrap_or("Programmer");
    format!("<h1>Hello, {}!</h1>", escape(name))
}
