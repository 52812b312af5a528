//! Listing-page strategy: scrape the rows of a `downloadtable` HTML table.

use crate::error::{PipelineError, PipelineResult};
use crate::types::ReleaseEntry;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    table: Regex,
    row: Regex,
    filename: Regex,
    href: Regex,
    checksum: Regex,
    platform: Regex,
    tags: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("listing patterns are valid");
        Patterns {
            table: re(r#"(?is)<table[^>]*\bclass="[^"]*\bdownloadtable\b[^"]*"[^>]*>(.*?)</table>"#),
            row: re(r"(?is)<tr\b[^>]*>(.*?)</tr>"),
            filename: re(r#"(?is)<td[^>]*\bclass="[^"]*\bfilename\b[^"]*"[^>]*>(.*?)</td>"#),
            href: re(r#"(?is)<a\b[^>]*\bhref="([^"]*)""#),
            checksum: re(r"(?is)<tt[^>]*>(.*?)</tt>"),
            platform: re(r"\.([a-z0-9]+-[a-z0-9]+)\.(?:tar\.gz|tar\.xz|zip|pkg|msi)$"),
            tags: re(r"<[^>]*>"),
        }
    })
}

fn inner_text(tags: &Regex, html: &str) -> String {
    tags.replace_all(html, "").trim().to_string()
}

/// Parse every download table row with a non-empty file name, in document order.
///
/// Download links are joined onto `origin` unless they are already absolute.
pub fn parse_listing_page(html: &str, origin: &str) -> PipelineResult<Vec<ReleaseEntry>> {
    let Patterns {
        table: re_table,
        row: re_row,
        filename: re_filename,
        href: re_href,
        checksum: re_checksum,
        platform: re_platform,
        tags: re_tags,
    } = patterns();

    let mut tables = re_table.captures_iter(html).peekable();
    if tables.peek().is_none() {
        return Err(PipelineError::SourceFormat(
            "no download table found on listing page".to_string(),
        ));
    }

    let mut entries = Vec::new();
    for table in tables {
        for row in re_row.captures_iter(&table[1]) {
            let row = &row[1];

            let name = re_filename
                .captures(row)
                .map(|c| inner_text(re_tags, &c[1]))
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            let href = re_href.captures(row).map(|c| c[1].to_string()).ok_or_else(|| {
                PipelineError::SourceFormat(format!("row for {} has no download link", name))
            })?;
            let checksum = re_checksum
                .captures(row)
                .map(|c| inner_text(re_tags, &c[1]))
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    PipelineError::SourceFormat(format!("row for {} has no checksum", name))
                })?;

            let url = if href.starts_with("http://") || href.starts_with("https://") {
                href
            } else {
                format!("{}{}", origin, href)
            };
            let platform = re_platform.captures(&name).map(|c| c[1].to_string());

            entries.push(ReleaseEntry {
                name,
                checksum,
                url,
                platform,
            });
        }
    }

    Ok(entries)
}
