use switchyard_core::route_registry::routes_for_group;
use switchyard_core::{
    App, HandlerResult, HttpMethod, HttpRequest, HttpResponse, MethodTable, PathParams,
    RouterBuilder, register_route,
};

struct Site;
struct Empty;
struct Clashing;

fn index(_: &HttpRequest, resp: &mut HttpResponse, _: &PathParams) -> HandlerResult {
    resp.set_text("Index page");
    Ok(())
}

fn upload(req: &HttpRequest, resp: &mut HttpResponse, _: &PathParams) -> HandlerResult {
    resp.set_text(format!("upload via {}", req.method));
    Ok(())
}

fn greet(_: &HttpRequest, resp: &mut HttpResponse, params: &PathParams) -> HandlerResult {
    let name = params.str("name").ok_or("missing name")?;
    resp.set_text(format!("Hello {name}!"));
    Ok(())
}

fn class_view() -> MethodTable {
    MethodTable::new()
        .get(|_, resp, _| {
            resp.set_text("Class-based view GET");
            Ok(())
        })
        .post(|_, resp, _| {
            resp.set_text("Class-based view POST");
            Ok(())
        })
}

register_route!(Site, "/", index);
register_route!(Site, "/upload/", upload, methods = [GET, POST]);
register_route!(Site, "/hello/{name}/", greet);
register_route!(Site, "/class-view/", view = class_view);

register_route!(Clashing, "/same/", index);
register_route!(Clashing, "/same", index);

#[test]
fn test_entries_grouped_and_in_source_order() {
    let patterns: Vec<&str> = routes_for_group::<Site>().iter().map(|e| e.pattern).collect();
    assert_eq!(patterns, vec!["/", "/upload/", "/hello/{name}/", "/class-view/"]);
    assert!(routes_for_group::<Empty>().is_empty());
}

#[test]
fn test_mount_into_router() {
    let mut builder = RouterBuilder::new();
    assert_eq!(builder.mount::<Site>().unwrap(), 4);
    let router = builder.build();

    let upload = router.resolve("/upload/").unwrap().route;
    assert_eq!(
        upload.allowed_methods().into_iter().collect::<Vec<_>>(),
        vec![HttpMethod::GET, HttpMethod::POST]
    );
    let index = router.resolve("/").unwrap().route;
    assert!(index.get_handler("HEAD").is_ok());
    assert!(index.get_handler("POST").is_err());
}

#[test]
fn test_mount_applies_duplicate_check() {
    let mut builder = RouterBuilder::new();
    assert!(builder.mount::<Clashing>().is_err());
}

#[test]
fn test_mounted_app_serves_requests() {
    let app = App::builder().mount::<Site>().build().unwrap();

    let resp = app.handle_request(HttpRequest::new("GET", "/hello/ada/")).unwrap();
    assert_eq!(resp.text(), "Hello ada!");

    let resp = app.handle_request(HttpRequest::new("POST", "/class-view/")).unwrap();
    assert_eq!(resp.text(), "Class-based view POST");

    let resp = app.handle_request(HttpRequest::new("POST", "/upload")).unwrap();
    assert_eq!(resp.text(), "upload via POST");

    let resp = app.handle_request(HttpRequest::new("DELETE", "/upload/")).unwrap();
    assert_eq!(resp.status, 405);
}
