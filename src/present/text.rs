use super::Render;
use crate::domain::LocationCollection;

/// Terminal output for the `lookup` loop: only the latest result is shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPresenter;

impl Render for TextPresenter {
    fn render(&self, locations: &LocationCollection) -> String {
        match locations.last() {
            Some(loc) => format!(
                "The latitude of the given address is: {}\nThe longitude of the given address is: {}\n{}",
                loc.latitude(),
                loc.longitude(),
                loc.label()
            ),
            None => String::new(),
        }
    }
}
