use askama::Template;
use axum::response::IntoResponse;

/// Third-party tags every page carries in its `<head>`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentShell {
    pub clarity_project_id: &'static str,
    pub adsense_client_id: &'static str,
}

pub const SHELL: DocumentShell = DocumentShell {
    clarity_project_id: "kqtqljq0re",
    adsense_client_id: "ca-pub-2803739586881684",
};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub shell: DocumentShell,
}

pub async fn index() -> impl IntoResponse {
    IndexTemplate { shell: SHELL }
}
