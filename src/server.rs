use std::path::Path;
use std::sync::Arc;
use std::{fs, io};

use ntex::http::StatusCode;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use serde::{Deserialize, Serialize};
use spdlog::{error, info, warn};

use crate::blog::Blog;
use crate::config::Config;
use crate::content::body_renderer::{BodyRenderer, MarkdownRenderer};
use crate::error::BlogError;
use crate::paginator::Paginator;
use crate::post::Post;
use crate::post_cache::Adjacent;
use crate::query_string::ListQuery;
use crate::session::{Sessions, SESSION_COOKIE, SESSION_DAYS};
use crate::store::Version;
use crate::view::list_renderer::ListRenderer;
use crate::view::post_renderer::PostRenderer;
use crate::view::rss_renderer::RssChannel;
use crate::view::sitemap_renderer::render_sitemap;

struct AppState {
    blog: Blog,
    sessions: Sessions,
    body_renderer: Box<dyn BodyRenderer>,
    config: Config,
}

fn read_template(template_dir: &Path, name: &str) -> io::Result<String> {
    let template_path = template_dir.join(name);
    match fs::read_to_string(&template_path) {
        Ok(src) => Ok(src),
        Err(e) => Err(io::Error::new(e.kind(), format!("Error reading template {}: {}", template_path.display(), e))),
    }
}

fn get_cur_page(req: &HttpRequest) -> u32 {
    ListQuery::parse(req.uri().query()).page()
}

fn html_error(e: io::Error) -> web::HttpResponse {
    error!("Error rendering page: {}", e);
    web::HttpResponse::InternalServerError()
        .body(format!("Error rendering page: {}", e))
}

fn render_index(state: &AppState, posts: &[Post], cur_page: u32, error: Option<&str>) -> io::Result<String> {
    let paginator = Paginator::new(posts, state.config.defaults.page_size);
    let cur_page = paginator.clamp(cur_page);
    let page = paginator.get_page(cur_page).unwrap_or_default();

    let template_src = read_template(&state.config.paths.template_dir, "index.tpl")?;
    let renderer = ListRenderer::new(&template_src)?;
    Ok(renderer.render(page, cur_page, paginator.page_count(), error))
}

#[web::get("/")]
async fn index(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let assembly = state.blog.assemble().await;
    let banner = assembly.store_error.as_ref().map(|e| e.to_string());

    match render_index(&state, assembly.collection.list(), get_cur_page(&req), banner.as_deref()) {
        Ok(rendered) => web::HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(e) => html_error(e),
    }
}

fn render_week(state: &AppState, post: &Post, adjacent: &Adjacent) -> io::Result<String> {
    let body = state.body_renderer.render(&post.content)?;
    let template_src = read_template(&state.config.paths.template_dir, "week.tpl")?;
    let renderer = PostRenderer::new(&template_src)?;
    Ok(renderer.render(post, &body, adjacent))
}

#[web::get("/week/{slug}")]
async fn week(slug: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let slug = slug.into_inner();
    let assembly = state.blog.assemble().await;

    let post = match assembly.collection.by_slug(&slug) {
        Some(post) => post,
        None => {
            if let Some(ref e) = assembly.store_error {
                return web::HttpResponse::ServiceUnavailable().body(e.to_string());
            }
            return web::HttpResponse::NotFound().body(format!("Week {} not found", slug));
        }
    };

    let adjacent = assembly.collection.adjacent(&slug);
    match render_week(&state, post, &adjacent) {
        Ok(rendered) => web::HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(e) => html_error(e),
    }
}

#[web::get("/feed.xml")]
async fn feed(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let Some(ref rss_feed) = state.config.rss_feed else {
        return web::HttpResponse::NotFound().finish();
    };

    let posts = state.blog.list_posts().await;
    let count = posts.len().min(rss_feed.page_size as usize);
    let rss = RssChannel {
        ch_title: &rss_feed.title,
        ch_link: &rss_feed.site_url,
        ch_desc: &rss_feed.description,
        ch_lang: rss_feed.language.as_deref(),
    };

    match rss.render(&posts[..count]) {
        Ok(xml) => web::HttpResponse::Ok()
            .content_type("application/xml; charset=utf-8")
            .body(xml),
        Err(e) => {
            error!("Error rendering RSS feed: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::get("/sitemap.xml")]
async fn sitemap(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let Some(ref rss_feed) = state.config.rss_feed else {
        return web::HttpResponse::NotFound().finish();
    };

    let last_modified = state.blog.list_posts().await.first().map(|p| p.date);
    match render_sitemap(&rss_feed.site_url, last_modified) {
        Ok(xml) => web::HttpResponse::Ok()
            .content_type("application/xml; charset=utf-8")
            .body(xml),
        Err(e) => {
            error!("Error rendering sitemap: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    if path.contains("..") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

// Begin: Admin API --------

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    slug: String,
    content: Option<String>,
    #[serde(default)]
    use_template: bool,
}

#[derive(Deserialize)]
struct UpdateRequest {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct DeleteRequest {
    sha: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostSummary<'a> {
    slug: &'a str,
    title: &'a str,
    week: u32,
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct WriteResponse {
    success: bool,
    slug: String,
    sha: Option<String>,
}

pub fn status_of(err: &BlogError) -> StatusCode {
    match err {
        BlogError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BlogError::NotFound(_) => StatusCode::NOT_FOUND,
        BlogError::MalformedPost { .. } | BlogError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
        BlogError::VersionConflict(_) | BlogError::DuplicateSlug(_) => StatusCode::CONFLICT,
    }
}

fn json_error(status: StatusCode, message: &str) -> web::HttpResponse {
    web::HttpResponse::build(status).json(&ErrorBody { error: message.to_string() })
}

fn blog_error(err: &BlogError) -> web::HttpResponse {
    json_error(status_of(err), &err.to_string())
}

/// Value of `name` in a `Cookie` header
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn session_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("cookie")?.to_str().ok()?;
    cookie_value(header, SESSION_COOKIE).map(|v| v.to_string())
}

fn authenticated(req: &HttpRequest, state: &AppState) -> bool {
    match session_token(req) {
        Some(token) => state.sessions.is_valid(&token),
        None => false,
    }
}

fn unauthorized() -> web::HttpResponse {
    json_error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax", SESSION_COOKIE, token, max_age_secs)
}

#[web::post("/api/login")]
async fn login(body: web::types::Json<LoginRequest>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !state.sessions.enabled() {
        warn!("Login attempt but no admin password is configured");
        return json_error(StatusCode::SERVICE_UNAVAILABLE, "Admin is disabled");
    }

    match state.sessions.login(&body.password) {
        Some(token) => {
            info!("Admin logged in");
            web::HttpResponse::Ok()
                .header("Set-Cookie", session_cookie(&token, SESSION_DAYS * 24 * 60 * 60))
                .json(&serde_json::json!({ "success": true }))
        }
        None => {
            warn!("Admin login failed");
            json_error(StatusCode::UNAUTHORIZED, "Invalid password")
        }
    }
}

#[web::post("/api/logout")]
async fn logout(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if let Some(token) = session_token(&req) {
        state.sessions.logout(&token);
    }
    web::HttpResponse::Ok()
        .header("Set-Cookie", session_cookie("", 0))
        .json(&serde_json::json!({ "success": true }))
}

#[web::get("/api/posts")]
async fn api_list(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !authenticated(&req, &state) {
        return unauthorized();
    }

    let assembly = state.blog.assemble().await;
    if let Some(ref e) = assembly.store_error {
        return blog_error(e);
    }

    let posts: Vec<PostSummary> = assembly.collection.list().iter()
        .map(|p| PostSummary {
            slug: p.slug.as_str(),
            title: p.title.as_str(),
            week: p.week_number,
            start_date: p.start_date.to_string(),
            end_date: p.end_date.to_string(),
        })
        .collect();
    let warnings: Vec<String> = assembly.warnings.iter().map(|w| w.to_string()).collect();
    let skipped: Vec<String> = assembly.skipped.iter().map(|e| e.to_string()).collect();

    web::HttpResponse::Ok().json(&serde_json::json!({
        "posts": posts,
        "warnings": warnings,
        "skipped": skipped,
    }))
}

#[web::post("/api/posts")]
async fn api_create(req: HttpRequest, body: web::types::Json<CreateRequest>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !authenticated(&req, &state) {
        return unauthorized();
    }

    let body = body.into_inner();
    if body.slug.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Slug is required");
    }

    let result = if body.use_template {
        state.blog.create_post_from_template(&body.slug).await
    } else {
        match body.content.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(content) => state.blog.create_post(&body.slug, content).await,
            None => return json_error(StatusCode::BAD_REQUEST, "Content is required"),
        }
    };

    match result {
        Ok(Version(sha)) => web::HttpResponse::Ok().json(&WriteResponse { success: true, slug: body.slug, sha: Some(sha) }),
        Err(e) => blog_error(&e),
    }
}

#[web::get("/api/posts/{slug}")]
async fn api_get(req: HttpRequest, slug: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !authenticated(&req, &state) {
        return unauthorized();
    }

    let slug = slug.into_inner();
    match state.blog.get_post_source(&slug).await {
        Ok(source) => web::HttpResponse::Ok().json(&serde_json::json!({
            "slug": slug,
            "content": source.content,
            "sha": source.version.as_str(),
            "path": source.path,
        })),
        Err(e) => blog_error(&e),
    }
}

#[web::put("/api/posts/{slug}")]
async fn api_update(
    req: HttpRequest,
    slug: web::types::Path<String>,
    body: web::types::Json<UpdateRequest>,
    state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !authenticated(&req, &state) {
        return unauthorized();
    }

    let slug = slug.into_inner();
    let body = body.into_inner();
    if body.content.trim().is_empty() || body.sha.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Content and sha are required");
    }

    match state.blog.update_post(&slug, &body.content, &Version(body.sha)).await {
        Ok(Version(sha)) => web::HttpResponse::Ok().json(&WriteResponse { success: true, slug, sha: Some(sha) }),
        Err(e) => blog_error(&e),
    }
}

#[web::delete("/api/posts/{slug}")]
async fn api_delete(
    req: HttpRequest,
    slug: web::types::Path<String>,
    body: web::types::Json<DeleteRequest>,
    state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    if !authenticated(&req, &state) {
        return unauthorized();
    }

    let slug = slug.into_inner();
    if body.sha.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "sha is required");
    }

    match state.blog.delete_post(&slug, &Version(body.sha.clone())).await {
        Ok(()) => web::HttpResponse::Ok().json(&WriteResponse { success: true, slug, sha: None }),
        Err(e) => blog_error(&e),
    }
}

// End: Admin API --------

pub async fn server_run(config: Config) -> anyhow::Result<()> {
    let blog = Blog::from_config(&config)?;

    let assembly = blog.assemble().await;
    info!("{} posts found in {}", assembly.collection.len(), blog.root_dir());

    let password = config.admin.as_ref().and_then(|a| a.resolve_password());
    if password.is_none() {
        warn!("No admin password configured, the admin API is disabled");
    }

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(AppState {
        blog,
        sessions: Sessions::new(password),
        body_renderer: Box::new(MarkdownRenderer {}),
        config,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(week)
            .service(feed)
            .service(sitemap)
            .service(public_files)
            .service(login)
            .service(logout)
            .service(api_list)
            .service(api_create)
            .service(api_get)
            .service(api_update)
            .service(api_delete)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await?;

    Ok(())
}
