//! GtkBuilder markup generation.
//!
//! [`generate`] projects a [`Layout`] onto a GtkBuilder `<interface>`
//! document.  The generated widget tree:
//!
//! ```text
//! viewport                 GtkFixed (rotation is applied to its child)
//! └ grid                   GtkBox, horizontal, one child per column
//!     └ column<C>          GtkBox, vertical, one child per row
//!         ├ row<C>_<R>     GtkBox, horizontal
//!         │   └ button<ID> GtkButton → GtkBox → GtkImage + GtkLabel
//!         └ infobar<ID>    GtkLabel
//! ```
//!
//! Buttons activate `launcher.run` with target `(uint32 ID, 'COMMAND')`.
//! Labels, paths and commands are escaped for GVariant text (commands) and
//! then for XML, so nothing in the entry file can alter the document
//! structure.
//!
//! # CSS classes
//!
//! | Class             | Targets                                  |
//! |-------------------|------------------------------------------|
//! | `.btngrid`        | The grid container                       |
//! | `.rotated`        | The grid container when turned by 90°    |
//! | `.btngrid-button` | Every button (use `:hover` / `:active`)  |
//! | `.hover`          | The button under the pointer             |
//! | `.infobar`        | Every infobar label                      |

use crate::entry::{button_widget_name, infobar_widget_name, Button, Entry, EntryId, Infobar};
use crate::grid::{Layout, Rotation, Row};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use std::collections::HashMap;
use std::string::FromUtf8Error;

/// Name of the action group installed on the launcher window.
pub const ACTION_GROUP: &str = "launcher";
/// Name of the button action inside [`ACTION_GROUP`].
pub const RUN_ACTION: &str = "run";
/// GVariant type string of the run action's parameter.
pub const RUN_ACTION_TYPE: &str = "(us)";

pub const VIEWPORT_ID: &str = "viewport";
pub const GRID_ID: &str = "grid";

/// Whether the grid is centred in the window or packed into its corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Center,
    Fill,
}

/// Presentation parameters that are not part of the entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupStyle {
    /// Multiplier applied to every size.
    pub scale: f64,
    pub spacing: u32,
    pub label_font_size: u32,
    pub alignment: Alignment,
}

impl Default for MarkupStyle {
    fn default() -> Self {
        Self {
            scale: 1.0,
            spacing: 10,
            label_font_size: 20,
            alignment: Alignment::Center,
        }
    }
}

impl MarkupStyle {
    fn px(&self, v: u32) -> u32 {
        (f64::from(v) * self.scale).round() as u32
    }

    /// Pango size attribute value (1/1024 pt) for a point size.
    fn pango_size(&self, points: u32) -> u32 {
        (f64::from(points) * self.scale * 1024.0).round() as u32
    }

    fn align(&self) -> &'static str {
        match self.alignment {
            Alignment::Center => "center",
            Alignment::Fill => "start",
        }
    }
}

/// Failure to serialise the document.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("failed to write markup: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("markup is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Render `layout` as a GtkBuilder document.
///
/// Grid ids missing from `entries` are skipped.
pub fn generate(
    layout: &Layout,
    entries: &[Entry],
    style: &MarkupStyle,
) -> Result<String, MarkupError> {
    let by_id: HashMap<EntryId, &Entry> = entries
        .iter()
        .filter_map(|e| e.id().map(|id| (id, e)))
        .collect();
    let size = layout.logical_size();
    let spacing = style.px(style.spacing).to_string();

    let mut doc = Doc::new();
    doc.declaration()?;
    doc.open("interface", &[])?;
    doc.object("GtkFixed", Some(VIEWPORT_ID))?;
    doc.open("child", &[])?;
    doc.object("GtkBox", Some(GRID_ID))?;
    doc.property("orientation", "horizontal")?;
    doc.property("spacing", &spacing)?;
    doc.property("width-request", &size.width.to_string())?;
    doc.property("height-request", &size.height.to_string())?;
    doc.property("halign", style.align())?;
    match layout.rotation {
        Rotation::Deg0 => doc.style(&["btngrid"])?,
        Rotation::Deg90 => doc.style(&["btngrid", "rotated"])?,
    }

    for (c, column) in layout.grid.columns.iter().enumerate() {
        doc.open("child", &[])?;
        doc.object("GtkBox", Some(format!("column{}", c).as_str()))?;
        doc.property("orientation", "vertical")?;
        doc.property("spacing", &spacing)?;
        doc.property("valign", style.align())?;
        doc.property("hexpand", "true")?;

        for (r, row) in column.rows.iter().enumerate() {
            match row {
                Row::Buttons(ids) => {
                    doc.open("child", &[])?;
                    doc.object("GtkBox", Some(format!("row{}_{}", c, r).as_str()))?;
                    doc.property("orientation", "horizontal")?;
                    doc.property("spacing", &spacing)?;
                    doc.property("halign", style.align())?;
                    for id in ids {
                        if let Some(Entry::Button(b)) = by_id.get(id) {
                            write_button(&mut doc, b, style)?;
                        }
                    }
                    doc.close("object")?;
                    doc.close("child")?;
                }
                Row::Infobar(id) => {
                    if let Some(Entry::Infobar(i)) = by_id.get(id) {
                        write_infobar(&mut doc, i, style)?;
                    }
                }
            }
        }

        doc.close("object")?;
        doc.close("child")?;
    }

    doc.close("object")?;
    doc.close("child")?;
    doc.close("object")?;
    doc.close("interface")?;
    Ok(String::from_utf8(doc.finish())?)
}

fn write_button(doc: &mut Doc, b: &Button, style: &MarkupStyle) -> quick_xml::Result<()> {
    let (width, height) = (style.px(b.width), style.px(b.height));
    let target = format!("(uint32 {}, {})", b.id, gvariant_string(&b.command));

    doc.open("child", &[])?;
    doc.object("GtkButton", Some(button_widget_name(b.id).as_str()))?;
    doc.property("action-name", &format!("{}.{}", ACTION_GROUP, RUN_ACTION))?;
    doc.property("action-target", &target)?;
    doc.property("width-request", &width.to_string())?;
    doc.property("height-request", &height.to_string())?;
    doc.style(&["btngrid-button"])?;
    doc.open("child", &[])?;
    doc.object("GtkBox", None)?;
    doc.property("orientation", "vertical")?;
    if let Some(icon) = &b.icon {
        // Leave room for the label below the image.
        let pixels = width.saturating_sub(style.px(20)).min(height.saturating_sub(style.px(40)));
        doc.open("child", &[])?;
        doc.object("GtkImage", None)?;
        doc.property("file", &icon.to_string_lossy())?;
        doc.property("pixel-size", &pixels.to_string())?;
        doc.property("vexpand", "true")?;
        doc.close("object")?;
        doc.close("child")?;
    }
    doc.open("child", &[])?;
    doc.object("GtkLabel", None)?;
    doc.property("label", &b.label)?;
    doc.property("valign", "end")?;
    doc.attributes(style.pango_size(style.label_font_size))?;
    doc.close("object")?;
    doc.close("child")?;
    doc.close("object")?;
    doc.close("child")?;
    doc.close("object")?;
    doc.close("child")
}

fn write_infobar(doc: &mut Doc, i: &Infobar, style: &MarkupStyle) -> quick_xml::Result<()> {
    doc.open("child", &[])?;
    doc.object("GtkLabel", Some(infobar_widget_name(i.id).as_str()))?;
    doc.property("halign", style.align())?;
    doc.attributes(style.pango_size(i.font_size))?;
    doc.style(&["infobar"])?;
    doc.close("object")?;
    doc.close("child")
}

/// Quote `s` as a GVariant text-format string literal.
pub fn gvariant_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

//  Writer

/// Thin GtkBuilder vocabulary over an indenting [`Writer`].
struct Doc {
    writer: Writer<Vec<u8>>,
}

impl Doc {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn declaration(&mut self) -> quick_xml::Result<()> {
        self.writer
            .write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> quick_xml::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.writer.write_event(XmlEvent::Start(start))
    }

    fn object(&mut self, class: &str, id: Option<&str>) -> quick_xml::Result<()> {
        match id {
            Some(id) => self.open("object", &[("class", class), ("id", id)]),
            None => self.open("object", &[("class", class)]),
        }
    }

    fn close(&mut self, tag: &str) -> quick_xml::Result<()> {
        self.writer.write_event(XmlEvent::End(BytesEnd::new(tag)))
    }

    fn property(&mut self, name: &str, value: &str) -> quick_xml::Result<()> {
        self.writer
            .create_element("property")
            .with_attribute(("name", name))
            .write_text_content(BytesText::new(value))?;
        Ok(())
    }

    fn style(&mut self, classes: &[&str]) -> quick_xml::Result<()> {
        self.open("style", &[])?;
        for class in classes {
            self.writer
                .create_element("class")
                .with_attribute(("name", *class))
                .write_empty()?;
        }
        self.close("style")
    }

    fn attributes(&mut self, pango_size: u32) -> quick_xml::Result<()> {
        self.open("attributes", &[])?;
        self.writer
            .create_element("attribute")
            .with_attribute(("name", "size"))
            .with_attribute(("value", pango_size.to_string().as_str()))
            .write_empty()?;
        self.close("attributes")
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

//  Tests
