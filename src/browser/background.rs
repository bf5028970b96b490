use crate::dispatcher::Message;

pub const MENU_TITLE: &str = "Get answer to this question";

/// Menu-side state: the entry is live only while something is selected,
/// and a click turns the current selection into an `answerQuestion`
/// message for the page.
#[derive(Debug, Default)]
pub struct Background {
    selection: String,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the menu entry should now be enabled.
    pub fn on_selection_changed(&mut self, text: &str) -> bool {
        self.selection = text.trim().to_string();
        self.menu_enabled()
    }

    pub fn menu_enabled(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn on_page_loaded(&mut self) {
        self.selection.clear();
    }

    pub fn on_menu_click(&self) -> Option<Message> {
        self.menu_enabled().then(|| Message::AnswerQuestion {
            selected_text: Some(self.selection.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_follows_selection() {
        let mut bg = Background::new();
        assert!(!bg.menu_enabled());
        assert!(bg.on_selection_changed("  photosynthesis "));
        assert!(!bg.on_selection_changed("   "));
    }

    #[test]
    fn click_sends_selection() {
        let mut bg = Background::new();
        bg.on_selection_changed("What is 2+2?");
        assert_eq!(
            bg.on_menu_click(),
            Some(Message::AnswerQuestion {
                selected_text: Some("What is 2+2?".to_string())
            })
        );
    }

    #[test]
    fn message_wire_shape() {
        let mut bg = Background::new();
        bg.on_selection_changed("kaunis");
        let json = serde_json::to_value(bg.on_menu_click().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "answerQuestion", "selectedText": "kaunis"})
        );
    }

    #[test]
    fn navigation_clears_selection() {
        let mut bg = Background::new();
        bg.on_selection_changed("word");
        bg.on_page_loaded();
        assert_eq!(bg.on_menu_click(), None);
    }
}
