//! Fixed-layout PDF rendering of a report table.
//!
//! Uses the standard Courier fonts, so no font data is embedded and every
//! character has the same advance width.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::core::diagnostics::Report;
use crate::core::export::HEADERS;

// A4 landscape, in points
const PAGE_WIDTH: i64 = 842;
const PAGE_HEIGHT: i64 = 595;
const MARGIN: i64 = 36;

const TITLE_SIZE: i64 = 12;
const FONT_SIZE: i64 = 8;
const LINE_HEIGHT: i64 = 11;
const ROW_GAP: i64 = 4;

/// Courier advances 600/1000 em per glyph; stored in thousandths of a point
const CHAR_WIDTH_MILLIPOINTS: i64 = 600 * FONT_SIZE;

/// Width of each column in characters, plus the gap between columns
const COLUMN_CHARS: [usize; 4] = [11, 13, 60, 66];
const COLUMN_GAP: usize = 2;

/// Render `report` as a PDF document
pub fn render(report: &Report) -> Result<Vec<u8>, String> {
    let title = format!(
        "Computer Diagnostic Report - {} - {}",
        report.platform(),
        report
            .generated_at()
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    );

    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops = Vec::new();
    let mut y = start_page(&mut ops, &title);
    let mut rows_on_page = 0;

    for entry in report.entries() {
        let cells = [
            wrap(entry.subsystem.name(), COLUMN_CHARS[0]),
            wrap(entry.state.label(), COLUMN_CHARS[1]),
            wrap(&entry.detail, COLUMN_CHARS[2]),
            wrap(entry.remediation.as_deref().unwrap_or(""), COLUMN_CHARS[3]),
        ];
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1) as i64;

        if rows_on_page > 0 && y - lines * LINE_HEIGHT < MARGIN {
            pages.push(std::mem::take(&mut ops));
            y = start_page(&mut ops, &title);
            rows_on_page = 0;
        }

        for (column, cell) in cells.iter().enumerate() {
            for (i, line) in cell.iter().enumerate() {
                text(&mut ops, "F1", FONT_SIZE, column_x(column), y - i as i64 * LINE_HEIGHT, line);
            }
        }

        y -= lines * LINE_HEIGHT + ROW_GAP;
        rows_on_page += 1;
    }
    pages.push(ops);

    assemble(pages)
}

/// Draw the title and column headers; returns the baseline of the first row
fn start_page(ops: &mut Vec<Operation>, title: &str) -> i64 {
    let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;
    text(ops, "F2", TITLE_SIZE, MARGIN, y, title);

    y -= TITLE_SIZE + LINE_HEIGHT;
    for (column, header) in HEADERS.iter().enumerate() {
        text(ops, "F2", FONT_SIZE, column_x(column), y, header);
    }

    let rule_y = y - 4;
    ops.push(Operation::new("w", vec![Object::Real(0.5)]));
    ops.push(Operation::new("m", vec![MARGIN.into(), rule_y.into()]));
    ops.push(Operation::new(
        "l",
        vec![(PAGE_WIDTH - MARGIN).into(), rule_y.into()],
    ));
    ops.push(Operation::new("S", vec![]));

    y - LINE_HEIGHT - ROW_GAP
}

fn column_x(column: usize) -> i64 {
    let chars: usize = COLUMN_CHARS[..column]
        .iter()
        .map(|width| width + COLUMN_GAP)
        .sum();
    MARGIN + chars as i64 * CHAR_WIDTH_MILLIPOINTS / 1000
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, line: &str) {
    if line.is_empty() {
        return;
    }
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(line))]));
    ops.push(Operation::new("ET", vec![]));
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, String> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| format!("cannot encode page content: {}", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        0i64.into(),
        0i64.into(),
        PAGE_WIDTH.into(),
        PAGE_HEIGHT.into(),
    ];
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| format!("cannot write PDF: {}", e))?;
    Ok(buf)
}

/// Encode for the standard fonts' WinAnsi encoding; other characters become `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Word wrap on character count; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while !word.is_empty() {
            let used = current.chars().count();
            let room = if used == 0 { width } else { width.saturating_sub(used + 1) };

            if word.len() <= room {
                if used > 0 {
                    current.push(' ');
                }
                current.extend(word.drain(..));
            } else if used > 0 {
                lines.push(std::mem::take(&mut current));
            } else {
                lines.push(word.drain(..width).collect());
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
