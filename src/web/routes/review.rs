// Minimal HTML page for reviewers: one card per pending memory with
// approve/reject buttons that call the JSON API.

use crate::core::moderation::{MemoryItem, Slug};
use crate::web::error::ApiError;
use crate::web::routes::moderation::TokenQuery;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Html;

/// `GET /api/review/:slug?token=`
pub async fn review_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Html<String>, ApiError> {
    let slug = Slug::parse(&slug)?;
    let pending = state
        .moderation
        .list_pending(&slug, query.token())
        .await?;
    Ok(Html(render_review_page(&slug, query.token(), &pending)))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_item(item: &MemoryItem) -> String {
    let author = item.author_name.as_deref().unwrap_or("Anonymous");
    let relationship = item
        .relationship
        .as_deref()
        .map(|r| format!(" <span class=\"rel\">({})</span>", escape_html(r)))
        .unwrap_or_default();
    let photo = item
        .photo_reference
        .as_deref()
        .map(|key| format!("<img src=\"/api/photo/{}\" alt=\"\">", escape_html(key)))
        .unwrap_or_default();

    format!(
        r#"<article data-id="{id}">
<h2>{author}{relationship}</h2>
<time>{submitted}</time>
<p>{text}</p>
{photo}
<button data-action="approve">Approve</button>
<button data-action="reject">Reject</button>
</article>"#,
        id = escape_html(&item.id),
        author = escape_html(author),
        relationship = relationship,
        submitted = item.submitted_at.format("%Y-%m-%d %H:%M UTC"),
        text = escape_html(&item.text).replace('\n', "<br>"),
        photo = photo,
    )
}

pub fn render_review_page(slug: &Slug, token: &str, pending: &[MemoryItem]) -> String {
    let body = if pending.is_empty() {
        "<p class=\"empty\">No memories are waiting for review.</p>".to_string()
    } else {
        pending.iter().map(render_item).collect::<Vec<_>>().join("\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Review memories - {slug}</title>
<style>
body {{ font-family: Georgia, serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; }}
article {{ border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }}
img {{ max-width: 100%; }}
.rel, time {{ color: #666; font-size: 0.9rem; }}
</style>
</head>
<body data-slug="{slug}" data-token="{token}">
<h1>Memories awaiting review ({count})</h1>
{body}
<script>
document.addEventListener('click', async (event) => {{
  const action = event.target.dataset.action;
  if (!action) return;
  const card = event.target.closest('article');
  const {{ slug, token }} = document.body.dataset;
  const url = `/api/${{action}}/${{encodeURIComponent(slug)}}/${{encodeURIComponent(card.dataset.id)}}?token=${{encodeURIComponent(token)}}`;
  const response = await fetch(url, {{ method: 'POST' }});
  if (response.ok) {{ card.remove(); }} else {{ alert((await response.json()).error); }}
}});
</script>
</body>
</html>
"#,
        slug = escape_html(slug.as_str()),
        token = escape_html(token),
        count = pending.len(),
        body = body,
    )
}
