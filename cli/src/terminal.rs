use library_client::{HistoryEntry, ListRenderer, Presenter, Resource, View};

/// Alerts go straight to stdout; view switches have nothing to draw.
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn alert(&self, message: &str) {
        println!("{message}");
    }

    fn show(&self, view: View) {
        tracing::debug!(?view, "switched view");
    }
}

/// Prints a list as one line per item, prefixed with its id.
pub struct TerminalRenderer;

impl<E: Resource> ListRenderer<E> for TerminalRenderer {
    fn render_list(&self, items: &[E]) {
        if items.is_empty() {
            println!("(no {})", E::COLLECTION);
            return;
        }
        for item in items {
            let fields = item
                .display_fields()
                .into_iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join(" | ");
            println!("[{}] {fields}", item.id());
        }
    }
}

pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("(no history)");
        return;
    }
    for entry in entries {
        let returned = entry
            .return_date
            .map_or_else(|| "not returned".to_string(), |date| date.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "[{}] book {} by member {}: issued {}, {returned}",
            entry.id,
            entry.book_id,
            entry.member_id,
            entry.issue_date.format("%Y-%m-%d %H:%M"),
        );
    }
}
