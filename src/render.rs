//! HTML mirror of the published menu.
//!
//! The public site includes a static fragment next to the canonical JSON so
//! pages can show the menu without parsing JSON. The fragment holds one
//! `<nav>` per language, each carrying `lang`, `dir` and a localized
//! `aria-label`:
//!
//! ```html
//! <nav class="site-menu" lang="he" dir="rtl" aria-label="ניווט ראשי">
//!   <ul>
//!     <li><a href="/he/">בית</a></li>
//!   </ul>
//! </nav>
//! ```
//!
//! The JSON file stays the source of truth; the fragment is rebuilt from it
//! and can always be regenerated with `menu-sync render`.

use crate::i18n::{Catalog, Direction, Language, Locale};
use crate::types::{MenuItem, MenuTree};
use maud::{Markup, PreEscaped, html};

const BANNER: &str = "<!-- generated by menu-sync; edit data/menu.json instead -->";

/// Render every language of `tree` into one fragment.
pub fn render_fragment(tree: &MenuTree, catalog: &Catalog, default: Language) -> Markup {
    html! {
        (PreEscaped(BANNER))
        @for (code, items) in &tree.languages {
            @let language = code.parse::<Language>().ok();
            @let locale = Locale::new(language.unwrap_or(default), default, catalog);
            @let dir = language.map(Language::direction).unwrap_or(Direction::Ltr);
            (render_language(code, items, dir, &locale))
        }
    }
}

/// Render one language's `<nav>`.
pub fn render_language(code: &str, items: &[MenuItem], dir: Direction, locale: &Locale) -> Markup {
    html! {
        nav.site-menu lang=(code) dir=(dir.as_str()) aria-label=(locale.t("nav.label")) {
            ul {
                @for item in items {
                    (render_item(item))
                }
            }
        }
    }
}

/// Render a single item and, recursively, its children.
fn render_item(item: &MenuItem) -> Markup {
    html! {
        li data-id=(item.id) class=[(!item.children.is_empty()).then_some("has-children")] {
            a href=(item.url) { (item.label) }
            @if !item.children.is_empty() {
                ul {
                    @for child in &item.children {
                        (render_item(child))
                    }
                }
            }
        }
    }
}
