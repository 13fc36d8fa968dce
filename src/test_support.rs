//! Fixture builders shared by the unit tests.

use crate::package::CommentParts;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" "#,
    r#"xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml""#,
);

pub fn comments_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:comments {}>{}</w:comments>"#,
        NAMESPACES, body
    )
}

pub fn extended_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w15:commentsEx {}>{}</w15:commentsEx>"#,
        NAMESPACES, body
    )
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
        NAMESPACES, body
    )
}

/// A `<w:comment>` with a single paragraph.
pub fn comment(id: &str, author: &str, para_id: &str, text: &str) -> String {
    format!(
        r#"<w:comment w:id="{id}" w:author="{author}" w:initials="{initials}" w:date="2024-05-0{day}T09:00:00Z"><w:p w14:paraId="{para_id}"><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p></w:comment>"#,
        initials = &author[..1],
        day = id.len().min(9),
    )
}

/// A `<w15:commentEx>` entry.
pub fn comment_ex(para_id: &str, parent: Option<&str>, done: bool) -> String {
    let parent = parent
        .map(|p| format!(r#" w15:paraIdParent="{}""#, p))
        .unwrap_or_default();
    format!(
        r#"<w15:commentEx w15:paraId="{}"{} w15:done="{}"/>"#,
        para_id,
        parent,
        if done { 1 } else { 0 }
    )
}

/// A paragraph with `text` anchored by comment `id`.
pub fn anchored_paragraph(id: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:commentRangeStart w:id="{id}"/><w:r><w:t xml:space="preserve">{text}</w:t></w:r><w:commentRangeEnd w:id="{id}"/><w:r><w:commentReference w:id="{id}"/></w:r></w:p>"#
    )
}

pub fn parts(comments: &str, extended: &str, document: &str) -> CommentParts {
    CommentParts::new(
        comments_xml(comments),
        extended_xml(extended),
        document_xml(document),
    )
}

/// Build a zip archive in memory.
pub fn docx_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
