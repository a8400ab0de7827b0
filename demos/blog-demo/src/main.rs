//! Blog Demo - Nested States Driven by the Location
//!
//! A small blog with a home page, a blog section with nested list and post
//! states, and an about page. The demo:
//! 1. registers the states with named views (`main`, `crumbs@`, and the
//!    unnamed view nested inside `blog`)
//! 2. puts a `BlogService` on the Bus for resolve factories
//! 3. walks a list of URLs through `Router::sync` and re-renders only the view
//!    ports whose content changed
//!
//! Run with `RUST_LOG=debug` to see every transition span. Set
//! `WAYMARK_CONFIG=path/to/waymark.toml` to load a router config.

use anyhow::anyhow;
use serde_json::{Value, json};
use std::sync::Arc;
use waymark::core::RegistrationError;
use waymark::prelude::*;

// ============================================================================
// 1. Blog data
// ============================================================================

struct BlogService {
    posts: Vec<Value>,
}

impl BlogService {
    fn sample() -> Self {
        Self {
            posts: vec![
                json!({ "id": "1", "title": "Hello, world", "category": "news", "archive": "2024-04" }),
                json!({ "id": "2", "title": "Nested states", "category": "rust", "archive": "2024-05" }),
                json!({ "id": "3", "title": "Resolving data", "category": "rust", "archive": "2024-05" }),
            ],
        }
    }

    fn field_values(&self, field: &str) -> Value {
        let mut values: Vec<&str> = self
            .posts
            .iter()
            .filter_map(|post| post[field].as_str())
            .collect();
        values.sort_unstable();
        values.dedup();
        json!(values)
    }

    fn filtered(&self, field: &str, value: Option<&str>) -> Value {
        let posts: Vec<&Value> = self
            .posts
            .iter()
            .filter(|post| post[field].as_str() == value)
            .collect();
        json!(posts)
    }

    fn recent(&self) -> Value {
        json!(self.posts.iter().rev().take(2).collect::<Vec<_>>())
    }

    fn post(&self, id: Option<&str>) -> Option<Value> {
        self.posts
            .iter()
            .find(|post| post["id"].as_str() == id)
            .cloned()
    }
}

fn blog(ctx: &ResolveContext) -> anyhow::Result<&BlogService> {
    ctx.bus.require::<BlogService>()
}

// ============================================================================
// 2. State tree
// ============================================================================

fn crumbs(trail: Value) -> ViewDefinition {
    ViewDefinition::new()
        .template_url("tpl/crumbs.html")
        .resolve("crumbs", move |_| {
            let trail = trail.clone();
            async move { Ok(trail) }
        })
}

fn register_states(router: &Router) -> Result<(), RegistrationError> {
    router.state(
        StateDefinition::new("home")
            .url("/")
            .view("main", ViewDefinition::new().template_url("tpl/home.html"))
            .view("crumbs@", crumbs(json!([{ "link": "#/", "title": "home" }]))),
    )?;

    router.state(
        StateDefinition::new("blog")
            .url("/blog")
            .resolve("categories", |ctx| async move { Ok(blog(&ctx)?.field_values("category")) })
            .resolve("archives", |ctx| async move { Ok(blog(&ctx)?.field_values("archive")) })
            .view(
                "main",
                ViewDefinition::new()
                    .template_url("tpl/blog.html")
                    .controller("BlogCtrl"),
            )
            .view("crumbs@", crumbs(json!([{ "link": "#/blog", "title": "blog" }]))),
    )?;

    router.state(
        StateDefinition::new("blog.recent").url("/recent").view(
            "",
            ViewDefinition::new()
                .template_url("tpl/blog.list.html")
                .resolve("title", |_| async { Ok(json!("Recent Posts")) })
                .resolve("posts", |ctx| async move { Ok(blog(&ctx)?.recent()) }),
        ),
    )?;

    router.state(
        StateDefinition::new("blog.category")
            .url("/category/{category}")
            .resolve("posts", |ctx| async move {
                Ok(blog(&ctx)?.filtered("category", ctx.params.get("category")))
            })
            .view("", ViewDefinition::new().template_url("tpl/blog.list.html"))
            .view("crumbs@", ViewDefinition::new().template_url("tpl/crumbs.html")),
    )?;

    router.state(
        StateDefinition::new("blog.archive")
            .url("/archive/{archive}")
            .resolve("posts", |ctx| async move {
                Ok(blog(&ctx)?.filtered("archive", ctx.params.get("archive")))
            })
            .view("", ViewDefinition::new().template_url("tpl/blog.list.html")),
    )?;

    router.state(
        StateDefinition::new("blog.post")
            .url("/post/{post}")
            .resolve("post", |ctx| async move {
                let id = ctx.params.get("post");
                blog(&ctx)?
                    .post(id)
                    .ok_or_else(|| anyhow!("no post with id {}", id.unwrap_or_default()))
            })
            .on_enter(|globals| tracing::info!(post = ?globals.params().get("post"), "Reading post"))
            .view(
                "",
                ViewDefinition::new()
                    .template_url("tpl/blog.post.html")
                    .controller("PostCtrl"),
            ),
    )?;

    router.state(StateDefinition::new("blog.post.comments").url("/comments"))?;

    router.state(
        StateDefinition::new("about")
            .url("/about")
            .view("main", ViewDefinition::new().template_url("tpl/about.html"))
            .view("crumbs@", crumbs(json!([{ "link": "#/about", "title": "about" }]))),
    )?;

    Ok(())
}

fn templates() -> MapTemplateLoader {
    MapTemplateLoader::new()
        .with("tpl/home.html", "<h1>Welcome</h1>")
        .with("tpl/about.html", "<h1>About</h1>")
        .with("tpl/crumbs.html", "<nav>{{crumbs}}</nav>")
        .with("tpl/blog.html", "<aside>{{categories}}</aside><div ui-view></div>")
        .with("tpl/blog.list.html", "<h2>{{title}}</h2><ul>{{posts}}</ul>")
        .with("tpl/blog.post.html", "<article>{{post}}</article>")
}

// ============================================================================
// 3. Rendering
// ============================================================================

fn render(router: &Router, ports: &mut [ViewPort]) {
    for port in ports.iter_mut() {
        match port.update(router) {
            ViewUpdate::Render(view) => println!(
                "  render {:<8} {} ({}) keys={:?}",
                port.name(),
                view.template(),
                view.controller().unwrap_or("-"),
                view.values().keys().collect::<Vec<_>>(),
            ),
            ViewUpdate::Clear => println!("  clear  {}", port.name()),
            ViewUpdate::Unchanged => {}
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,waymark_runtime=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::var("WAYMARK_CONFIG") {
        Ok(path) => RouterConfig::from_file(path)?,
        Err(_) => RouterConfig {
            default_url: Some("/".into()),
            ..RouterConfig::default()
        },
    }
    .with_env_overrides();

    let location = Arc::new(MemoryLocation::new("/"));
    let router = Router::builder()
        .config(config)
        .bus(Bus::new().with(BlogService::sample()))
        .templates(templates())
        .location(location.clone())
        .build();
    register_states(&router)?;

    let mut events = router.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(phase = ?event.phase, from = %event.from, to = %event.to, "Transition event");
        }
    });

    let mut ports = vec![ViewPort::new("main", None), ViewPort::new("crumbs", None)];
    let mut content: Option<ViewPort> = None;

    for url in [
        "/",
        "/blog",
        "/blog/category/rust",
        "/blog/post/2",
        "/blog/post/2/comments",
        "/blog/post/9",
        "/nowhere",
        "/about",
    ] {
        println!("{url}");
        location.push(url);
        if let Err(err) = router.sync().await {
            println!("  error  {err}");
            continue;
        }

        render(&router, &mut ports);
        // The unnamed view inside the blog template is a nested port.
        let enclosing = ports[0].locals().cloned();
        content = enclosing.map(|main| {
            let mut port = match content.take() {
                Some(port) if port.name() == format!("@{}", main.state()) => port,
                _ => ViewPort::new("", Some(main.as_ref())),
            };
            render(&router, std::slice::from_mut(&mut port));
            port
        });
    }

    router
        .go("blog.archive", Params::new().with("archive", "2024-05"), TransitionOptions::default())
        .await?;
    println!("now at {} with {:?}", router.current().name, router.params());
    println!(
        "link to post 3: {}",
        router
            .href("blog.post", Params::new().with("post", 3), HrefOptions::default())
            .unwrap_or_default()
    );
    println!("history: {:?}", location.history());

    Ok(())
}
