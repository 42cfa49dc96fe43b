//! Page and table helpers over `scraper`.
//!
//! Tab parsers read cells through [`RowReader`] and labels through
//! [`label_sibling_text`], so a portal layout shift is absorbed here rather
//! than in every parser.

use std::fmt::Display;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::{CompassError, Result};

/// Form action the profile tabs redirect to when the viewer lacks access.
pub const DENIED_PROFILE_ACTION: &str = "./ScoutsPortal.aspx?Invalid=AccessCN";

/// Form action the role popup redirects to when the viewer lacks access.
pub const DENIED_POPUP_ACTION: &str = "./ScoutsPortal.aspx?Invalid=Access";

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

static FORM: LazyLock<Selector> = LazyLock::new(|| selector("form"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static FORM_CONTROL: LazyLock<Selector> =
    LazyLock::new(|| selector("input[name], select[name], textarea[name]"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option"));

/// One parsed portal page.
pub struct Page {
    doc: Html,
}

impl Page {
    pub fn parse(bytes: &[u8]) -> Self {
        let html = String::from_utf8_lossy(bytes);
        Self {
            doc: Html::parse_document(&html),
        }
    }

    pub fn document(&self) -> &Html {
        &self.doc
    }

    pub fn select_first<'a>(&'a self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.doc.select(selector).next()
    }

    /// The page's primary (first) form.
    pub fn form(&self) -> Option<ElementRef<'_>> {
        self.select_first(&FORM)
    }

    pub fn form_action(&self) -> Option<&str> {
        self.form().and_then(|form| form.value().attr("action"))
    }

    /// Fail with `PermissionDenied` if the form posts to `sentinel`.
    pub fn ensure_access(&self, sentinel: &str, identifier: impl Display) -> Result<()> {
        match self.form_action() {
            Some(action) if action == sentinel => {
                tracing::debug!(%identifier, action, "Access denied sentinel found");
                Err(CompassError::permission_denied(identifier))
            }
            _ => Ok(()),
        }
    }

    pub fn title(&self) -> Option<String> {
        self.select_first(&TITLE)
            .map(|title| title.text().collect::<String>().trim().to_string())
    }

    /// A named control of the primary form.
    pub fn form_control(&self, name: &str) -> Option<ElementRef<'_>> {
        let form = self.form()?;
        form.select(&FORM_CONTROL)
            .find(|control| control.value().attr("name") == Some(name))
    }

    /// Named controls of the primary form whose name contains `fragment`.
    pub fn form_controls_containing<'a>(&'a self, fragment: &str) -> Vec<ElementRef<'a>> {
        let Some(form) = self.form() else {
            return Vec::new();
        };
        form.select(&FORM_CONTROL)
            .filter(|control| {
                control
                    .value()
                    .attr("name")
                    .is_some_and(|name| name.contains(fragment))
            })
            .collect()
    }

    /// Submitted value of a form field, as a browser would send it.
    pub fn form_field(&self, name: &str) -> Option<String> {
        self.form_control(name).and_then(field_value)
    }
}

/// Value of an `input`, `select` or `textarea` control.
///
/// Selects yield their selected option, falling back to the first option.
pub fn field_value(control: ElementRef<'_>) -> Option<String> {
    let el = control.value();
    match el.name() {
        "select" => {
            let mut options = control.select(&OPTION);
            let first = options.next()?;
            let selected = std::iter::once(first)
                .chain(options)
                .find(|option| option.value().attr("selected").is_some())
                .unwrap_or(first);
            Some(option_value(selected))
        }
        "textarea" => Some(control.text().collect()),
        _ => match el.attr("type") {
            Some("checkbox") | Some("radio") if el.attr("checked").is_none() => None,
            _ => Some(el.attr("value").unwrap_or_default().to_string()),
        },
    }
}

/// The option explicitly marked `selected`, if any.
pub fn selected_option(select: ElementRef<'_>) -> Option<ElementRef<'_>> {
    select
        .select(&OPTION)
        .find(|option| option.value().attr("selected").is_some())
}

pub fn option_value(option: ElementRef<'_>) -> String {
    match option.value().attr("value") {
        Some(value) => value.to_string(),
        None => text_of(option),
    }
}

/// Element children of `el`, skipping text and comments.
pub fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

pub fn nth_child(el: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    element_children(el).nth(n)
}

/// Rows of a table, looking through the implied `tbody`.
pub fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in element_children(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(element_children(child).filter(|row| row.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

/// All text beneath `el`, whitespace collapsed and trimmed.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `true` if one of `el`'s own text nodes is exactly `label`.
fn has_own_text(el: ElementRef<'_>, label: &str) -> bool {
    el.children()
        .filter_map(|node| node.value().as_text())
        .any(|text| &**text == label)
}

/// Read the `cell`th `td` reached by climbing `levels` ancestors from the
/// element whose own text is exactly `label`.
///
/// `label_sibling_text(scope, "Gender:", 2, 1)` reads the second cell of the
/// row holding `<td><label>Gender:</label></td>`.
pub fn label_sibling_text(
    scope: ElementRef<'_>,
    label: &str,
    levels: usize,
    cell: usize,
) -> Option<String> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| has_own_text(*el, label))
        .find_map(|anchor| {
            let mut node = anchor;
            for _ in 0..levels {
                node = node.parent().and_then(ElementRef::wrap)?;
            }
            element_children(node)
                .filter(|child| child.value().name() == "td")
                .nth(cell)
                .map(text_of)
        })
}

/// Positional access to the cells of one table row.
pub struct RowReader<'a> {
    row: ElementRef<'a>,
    cells: Vec<ElementRef<'a>>,
}

impl<'a> RowReader<'a> {
    pub fn new(row: ElementRef<'a>) -> Self {
        let cells = element_children(row)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();
        Self { row, cells }
    }

    pub fn row(&self) -> ElementRef<'a> {
        self.row
    }

    pub fn row_attr(&self, name: &str) -> Option<&'a str> {
        self.row.value().attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.row.value().classes().any(|c| c == class)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<ElementRef<'a>> {
        self.cells.get(index).copied()
    }

    /// Normalised text of a cell; empty when the cell is missing.
    pub fn text(&self, index: usize) -> String {
        self.cell(index).map(text_of).unwrap_or_default()
    }

    pub fn opt_text(&self, index: usize) -> Option<String> {
        crate::coerce::non_empty(self.text(index))
    }

    pub fn cell_attr(&self, index: usize, name: &str) -> Option<&'a str> {
        self.cell(index).and_then(|cell| cell.value().attr(name))
    }

    /// The `n`th element child of cell `index`.
    pub fn cell_child(&self, index: usize, n: usize) -> Option<ElementRef<'a>> {
        self.cell(index).and_then(|cell| nth_child(cell, n))
    }

    /// Drop a leading selection-checkbox cell.
    ///
    /// When any row on the page is selectable, every row gains a first cell
    /// that holds an `input` or nothing at all. A text-only cell is kept.
    pub fn drop_leading_selector(&mut self) -> bool {
        let Some(first) = self.cells.first().copied() else {
            return false;
        };
        let is_empty = element_children(first).next().is_none() && text_of(first).is_empty();
        let is_selector =
            is_empty || element_children(first).any(|child| child.value().name() == "input");
        if is_selector {
            self.cells.remove(0);
        }
        is_selector
    }
}
