//! HTML gallery writer
//!
//! Renders the aggregated media of all subjects into one self-contained
//! HTML file: a masonry grid with a subject filter, a media-type select,
//! and newest-first ordering. The media data is embedded as a script
//! literal so the file needs no server to view.

use crate::crawler::Subject;
use crate::media::MediaStore;
use crate::output::traits::{MediaSink, OutputError, OutputResult};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Default sink: writes the gallery HTML to a configured path
#[derive(Debug)]
pub struct GalleryWriter {
    path: PathBuf,
}

impl GalleryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MediaSink for GalleryWriter {
    fn publish(
        &mut self,
        subjects: &[Subject],
        stores: &HashMap<String, MediaStore>,
    ) -> OutputResult<String> {
        let html = build_gallery_html(subjects, stores)?;
        std::fs::write(&self.path, html)?;
        tracing::info!("Gallery written to {}", self.path.display());
        Ok(self.path.display().to_string())
    }
}

/// Builds the gallery document; fails with [`OutputError::NoMedia`] when
/// no subject produced a usable item
pub fn build_gallery_html(
    subjects: &[Subject],
    stores: &HashMap<String, MediaStore>,
) -> OutputResult<String> {
    let names: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
    let names_joined = names.join(", ");

    let start_year = subjects.iter().map(|s| s.start_year).min().unwrap_or(0);
    let end_year = subjects.iter().map(|s| s.end_year).max().unwrap_or(0);

    let mut total_items = 0usize;
    let mut media_data = String::from("const mediaData = {\n");
    for subject in subjects {
        let key = subject.name.replace(' ', "_");
        let _ = write!(media_data, "  \"{}\": [", js_escape(&key));
        if let Some(store) = stores.get(&subject.name) {
            for item in store.items_newest_first() {
                if !item.url.starts_with("http://") && !item.url.starts_with("https://") {
                    tracing::warn!("Skipping invalid URL for {}: {}", subject.name, item.url);
                    continue;
                }
                total_items += 1;
                let _ = write!(
                    media_data,
                    "\n    {{type: \"{}\", src: \"{}\", date: \"{}\"}},",
                    item.kind,
                    js_escape(&item.url),
                    js_escape(&item.date)
                );
            }
        }
        media_data.push_str("\n  ],\n");
    }
    media_data.push_str("};\n");

    if total_items == 0 {
        return Err(OutputError::NoMedia);
    }

    let mut buttons = String::from(
        r#"<button class="filter-button active" data-subject="">All</button>"#,
    );
    for subject in subjects {
        let _ = write!(
            buttons,
            r#"<button class="filter-button" data-subject="{}">{}</button>"#,
            html_escape(&subject.name.replace(' ', "_")),
            html_escape(&subject.name)
        );
    }

    let title = format!("{} - Media Gallery ({}-{})", names_joined, start_year, end_year);

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
  <style>
    body {{ background-color: #000; font-family: Arial, sans-serif; margin: 0; padding: 20px; color: white; }}
    h1 {{ text-align: center; margin-bottom: 20px; }}
    .button-container {{ text-align: center; margin-bottom: 20px; display: flex; flex-wrap: wrap; justify-content: center; gap: 10px; }}
    .filter-button {{ padding: 10px 20px; font-size: 16px; border-radius: 5px; border: none; background-color: #333; color: white; cursor: pointer; }}
    .filter-button.active {{ background-color: #007bff; }}
    .media-type-select {{ padding: 8px; font-size: 16px; border-radius: 5px; border: none; background-color: #333; color: white; }}
    .masonry {{ display: flex; justify-content: center; gap: 15px; }}
    .column {{ flex: 1; display: flex; flex-direction: column; gap: 15px; }}
    .column img, .column video {{ width: 100%; border-radius: 5px; display: block; }}
    @media (max-width: 768px) {{ .masonry {{ flex-direction: column; }} }}
  </style>
</head>
<body>
  <h1>{heading}</h1>
  <div class="button-container">
    <select id="mediaType" class="media-type-select">
      <option value="all" selected>All</option>
      <option value="images">Images</option>
      <option value="videos">Videos</option>
      <option value="gifs">Gifs</option>
    </select>
    {buttons}
  </div>
  <div class="masonry" id="masonry"></div>
  <script>
    {media_data}
    const masonry = document.getElementById("masonry");
    const buttonEls = document.querySelectorAll(".filter-button");
    const typeSelect = document.getElementById("mediaType");
    let selectedSubject = "";

    function selectedMedia() {{
      const type = typeSelect.value;
      const keys = selectedSubject ? [selectedSubject] : Object.keys(mediaData);
      let items = keys.flatMap(key => mediaData[key] || []);
      if (type !== "all") {{
        items = items.filter(item => item.type === type);
      }}
      return items.sort((a, b) => new Date(b.date) - new Date(a.date));
    }}

    function render() {{
      masonry.innerHTML = "";
      const columns = [];
      for (let i = 0; i < 3; i++) {{
        const col = document.createElement("div");
        col.className = "column";
        masonry.appendChild(col);
        columns.push(col);
      }}
      selectedMedia().forEach((item, index) => {{
        let element;
        if (item.type === "videos") {{
          element = document.createElement("video");
          element.controls = true;
        }} else {{
          element = document.createElement("img");
          element.loading = "lazy";
        }}
        element.src = item.src;
        columns[index % 3].appendChild(element);
      }});
    }}

    buttonEls.forEach(button => {{
      button.addEventListener("click", () => {{
        buttonEls.forEach(b => b.classList.remove("active"));
        button.classList.add("active");
        selectedSubject = button.getAttribute("data-subject");
        render();
      }});
    }});
    typeSelect.addEventListener("change", render);
    render();
  </script>
</body>
</html>
"#,
        title = html_escape(&title),
        heading = html_escape(&title),
        buttons = buttons,
        media_data = media_data,
    );

    Ok(html)
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "")
        .replace('\r', "")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
