//! Link preview handler.

use zos_api::models::LinkPreview;
use zos_core::{Runtime, RuntimeConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(p: &LinkPreview) -> String {
    let mut lines = vec![format!("URL:          {}", p.url)];
    if let Some(ref title) = p.title {
        lines.push(format!("Title:        {title}"));
    }
    if let Some(ref description) = p.description {
        lines.push(format!("Description:  {description}"));
    }
    if let Some(ref kind) = p.preview_type {
        lines.push(format!("Type:         {kind}"));
    }
    if let Some(ref thumb) = p.thumbnail {
        lines.push(format!("Thumbnail:    {}", thumb.url));
    }
    lines.join("\n")
}

pub async fn handle(config: RuntimeConfig, url: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let target = url.to_owned();
    let preview = Runtime::oneshot(config, |rt| async move {
        rt.api().get_link_preview(&target).await
    })
    .await?;

    let out = output::render_single(&global.output, &preview, detail, |p| {
        p.title.clone().unwrap_or_else(|| p.url.clone())
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
