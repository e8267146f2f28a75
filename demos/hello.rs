//! Sample application: a handful of routes driven in-process.
//!
//! Run with `cargo run --example hello --features handlebars`.

use serde_json::json;
use std::path::PathBuf;
use switchyard::logging::{LogConfig, LogFormat, LogLevel, info};
use switchyard::prelude::*;
use switchyard::{MethodTable, StaticDir};
use switchyard_handlebars::{HandlebarsConfig, HandlebarsEngine};

struct Sample;

fn text(_: &HttpRequest, resp: &mut HttpResponse, _: &PathParams) -> HandlerResult {
    resp.set_text("Hello!");
    Ok(())
}

fn hello(_: &HttpRequest, resp: &mut HttpResponse, params: &PathParams) -> HandlerResult {
    let name = params.str("name").ok_or("missing name")?;
    resp.set_text(format!("Hello {name}!"));
    Ok(())
}

fn add(_: &HttpRequest, resp: &mut HttpResponse, params: &PathParams) -> HandlerResult {
    let a = params.int("first").ok_or("missing first")?;
    let b = params.int("second").ok_or("missing second")?;
    resp.set_text(format!("Sum: {}", a + b));
    Ok(())
}

fn limited(req: &HttpRequest, resp: &mut HttpResponse, _: &PathParams) -> HandlerResult {
    resp.set_text(format!("HTTP method: {}!", req.method));
    Ok(())
}

fn class_view() -> MethodTable {
    MethodTable::new()
        .get(|_, resp, _| {
            resp.set_text("Sample class-view GET page");
            Ok(())
        })
        .post(|_, resp, _| {
            resp.set_text("Sample class-view POST page");
            Ok(())
        })
}

register_route!(Sample, "/text/", text);
register_route!(Sample, "/hello/{name}/", hello);
register_route!(Sample, "/add/{first:int}/{second:int}/", add);
register_route!(Sample, "/limited-view/", limited, methods = [GET, POST]);
register_route!(Sample, "/class-view/", view = class_view);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = LogConfig::new()
        .level(LogLevel::Info)
        .format(LogFormat::Compact)
        .init()?;

    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos");
    let engine = HandlebarsEngine::new(HandlebarsConfig::new(root.join("templates")))?;
    let renderer = engine.clone();

    let app = App::builder()
        .route("/", move |_, resp, _| {
            let context = json!({
                "title": "Sample template view",
                "routes": ["/text/", "/hello/{name}/", "/add/{first}/{second}/"],
            });
            resp.set_text(renderer.render("home", &context)?);
            Ok(())
        })
        .mount::<Sample>()
        .route("/external", |_, resp, _| {
            resp.set_text("External route");
            Ok(())
        })
        .middleware(LoggingMiddleware::new())
        .middleware(RequestIdMiddleware)
        .template_engine(engine)
        .static_files(StaticDir::new(root.join("static"))?)
        .build()?;

    let requests = [
        ("GET", "/"),
        ("GET", "/text/"),
        ("GET", "/hello/sample-name/"),
        ("GET", "/add/3/4/"),
        ("POST", "/limited-view/"),
        ("DELETE", "/limited-view/"),
        ("POST", "/class-view/"),
        ("GET", "/external/"),
        ("GET", "/static/main.css"),
        ("GET", "/missing/"),
    ];

    for (method, target) in requests {
        let response = app.handle_request(HttpRequest::new(method, target))?;
        info!(method, target, status = response.status, "Handled");
        println!("{method} {target} -> {}\n{}\n", response.status, response.text());
    }

    Ok(())
}
