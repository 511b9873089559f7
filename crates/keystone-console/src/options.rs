use std::fmt;

pub const DEFAULT_CATEGORY: &str = "Default";

pub type ToggleFn = Box<dyn FnMut(bool)>;
pub type ActionFn = Box<dyn FnMut()>;
pub type InputFn = Box<dyn FnMut(&str)>;

/// Handle returned by [`OptionsTab::add_option`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(u64);

impl OptionId {
    #[inline]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// One interactive row of the options tab.
pub enum OptionData {
    Text {
        label: String,
        text: String,
    },
    Toggle {
        label: String,
        value: bool,
        on_changed: Option<ToggleFn>,
    },
    Action {
        label: String,
        on_action: Option<ActionFn>,
    },
    Input {
        label: String,
        value: String,
        on_changed: Option<InputFn>,
        on_submitted: Option<InputFn>,
    },
}

impl OptionData {
    pub fn text(label: impl Into<String>, text: impl Into<String>) -> Self {
        OptionData::Text {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn toggle(label: impl Into<String>, value: bool, f: impl FnMut(bool) + 'static) -> Self {
        OptionData::Toggle {
            label: label.into(),
            value,
            on_changed: Some(Box::new(f)),
        }
    }

    pub fn action(label: impl Into<String>, f: impl FnMut() + 'static) -> Self {
        OptionData::Action {
            label: label.into(),
            on_action: Some(Box::new(f)),
        }
    }

    pub fn input(label: impl Into<String>, on_submitted: impl FnMut(&str) + 'static) -> Self {
        OptionData::Input {
            label: label.into(),
            value: String::new(),
            on_changed: None,
            on_submitted: Some(Box::new(on_submitted)),
        }
    }

    /// Adds a change callback to an input option; other kinds are returned unchanged.
    pub fn on_input_changed(mut self, f: impl FnMut(&str) + 'static) -> Self {
        if let OptionData::Input { on_changed, .. } = &mut self {
            *on_changed = Some(Box::new(f));
        }
        self
    }

    pub fn label(&self) -> &str {
        match self {
            OptionData::Text { label, .. }
            | OptionData::Toggle { label, .. }
            | OptionData::Action { label, .. }
            | OptionData::Input { label, .. } => label,
        }
    }

    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            OptionData::Text { .. } => "text",
            OptionData::Toggle { .. } => "toggle",
            OptionData::Action { .. } => "action",
            OptionData::Input { .. } => "input",
        }
    }
}

impl fmt::Display for OptionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionData::Text { label, text } => write!(f, "{label}: {text}"),
            OptionData::Toggle { label, value, .. } => {
                write!(f, "{label}: [{}]", if *value { "x" } else { " " })
            }
            OptionData::Action { label, .. } => write!(f, "<{label}>"),
            OptionData::Input { label, value, .. } => write!(f, "{label}: \"{value}\""),
        }
    }
}

impl fmt::Debug for OptionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionData::{}({self})", self.kind())
    }
}

#[derive(Debug)]
pub struct OptionCategory {
    name: String,
    collapsed: bool,
    options: Vec<(OptionId, OptionData)>,
}

impl OptionCategory {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn options(&self) -> impl Iterator<Item = (OptionId, &OptionData)> {
        self.options.iter().map(|(id, d)| (*id, d))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    UnknownOption(OptionId),
    UnknownLabel(String),
    WrongKind {
        label: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::UnknownOption(id) => {
                write!(f, "option #{} is not part of any category", id.0)
            }
            OptionError::UnknownLabel(l) => write!(f, "no option labelled '{l}'"),
            OptionError::WrongKind {
                label,
                expected,
                found,
            } => write!(f, "option '{label}' is a {found} option, not {expected}"),
        }
    }
}

impl std::error::Error for OptionError {}

/// Options grouped into ordered categories. `Default` always exists at first.
#[derive(Debug)]
pub struct OptionsTab {
    categories: Vec<OptionCategory>,
    next_id: u64,
}

impl Default for OptionsTab {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsTab {
    pub fn new() -> Self {
        let mut tab = Self {
            categories: Vec::new(),
            next_id: 0,
        };
        tab.add_category(DEFAULT_CATEGORY);
        tab
    }

    fn add_category(&mut self, name: &str) -> usize {
        self.categories.push(OptionCategory {
            name: name.to_owned(),
            collapsed: false,
            options: Vec::new(),
        });
        self.categories.len() - 1
    }

    /// Adds `data` under `category`, creating the category when missing.
    pub fn add_option(&mut self, category: &str, data: OptionData) -> OptionId {
        let idx = match self.categories.iter().position(|c| c.name == category) {
            Some(i) => i,
            None => self.add_category(category),
        };
        self.next_id += 1;
        let id = OptionId(self.next_id);
        self.categories[idx].options.push((id, data));
        id
    }

    /// Removes an option. A category left empty is removed too, `Default` included.
    pub fn remove_option(&mut self, id: OptionId) -> Result<OptionData, OptionError> {
        let (ci, oi) = self.locate(id).ok_or(OptionError::UnknownOption(id))?;
        let (_, data) = self.categories[ci].options.remove(oi);
        if self.categories[ci].options.is_empty() {
            self.categories.remove(ci);
        }
        Ok(data)
    }

    fn locate(&self, id: OptionId) -> Option<(usize, usize)> {
        self.categories.iter().enumerate().find_map(|(ci, c)| {
            c.options
                .iter()
                .position(|(oid, _)| *oid == id)
                .map(|oi| (ci, oi))
        })
    }

    pub fn get(&self, id: OptionId) -> Option<&OptionData> {
        let (ci, oi) = self.locate(id)?;
        Some(&self.categories[ci].options[oi].1)
    }

    fn get_mut(&mut self, id: OptionId) -> Result<&mut OptionData, OptionError> {
        let (ci, oi) = self.locate(id).ok_or(OptionError::UnknownOption(id))?;
        Ok(&mut self.categories[ci].options[oi].1)
    }

    /// First option with the given label, case-insensitive.
    pub fn find(&self, label: &str) -> Option<OptionId> {
        self.categories
            .iter()
            .flat_map(|c| c.options.iter())
            .find(|(_, d)| d.label().eq_ignore_ascii_case(label))
            .map(|(id, _)| *id)
    }

    #[inline]
    pub fn categories(&self) -> &[OptionCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&OptionCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn set_collapsed(&mut self, category: &str, collapsed: bool) -> bool {
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(c) => {
                c.collapsed = collapsed;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(OptionCategory::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets a toggle and fires its callback when the value changed.
    pub fn set_toggle(&mut self, id: OptionId, new_value: bool) -> Result<(), OptionError> {
        match self.get_mut(id)? {
            OptionData::Toggle {
                value, on_changed, ..
            } => {
                if *value != new_value {
                    *value = new_value;
                    if let Some(f) = on_changed {
                        f(new_value);
                    }
                }
                Ok(())
            }
            other => Err(wrong_kind(other, "toggle")),
        }
    }

    pub fn trigger_action(&mut self, id: OptionId) -> Result<(), OptionError> {
        match self.get_mut(id)? {
            OptionData::Action { on_action, .. } => {
                if let Some(f) = on_action {
                    f();
                }
                Ok(())
            }
            other => Err(wrong_kind(other, "action")),
        }
    }

    /// Replaces the input text and fires its change callback.
    pub fn set_input(&mut self, id: OptionId, text: &str) -> Result<(), OptionError> {
        match self.get_mut(id)? {
            OptionData::Input {
                value, on_changed, ..
            } => {
                *value = text.to_owned();
                if let Some(f) = on_changed {
                    f(text);
                }
                Ok(())
            }
            other => Err(wrong_kind(other, "input")),
        }
    }

    /// Submits the current input text.
    pub fn submit_input(&mut self, id: OptionId) -> Result<(), OptionError> {
        match self.get_mut(id)? {
            OptionData::Input {
                value,
                on_submitted,
                ..
            } => {
                if let Some(f) = on_submitted {
                    f(value.as_str());
                }
                Ok(())
            }
            other => Err(wrong_kind(other, "input")),
        }
    }

    pub fn set_text(
        &mut self,
        id: OptionId,
        new_text: impl Into<String>,
    ) -> Result<(), OptionError> {
        match self.get_mut(id)? {
            OptionData::Text { text, .. } => {
                *text = new_text.into();
                Ok(())
            }
            other => Err(wrong_kind(other, "text")),
        }
    }

    /// Text rendering: one header per category, one line per option.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in &self.categories {
            let marker = if c.collapsed { "+" } else { "-" };
            out.push_str(&format!("{marker} {}\n", c.name));
            if c.collapsed {
                continue;
            }
            for (_, d) in &c.options {
                out.push_str(&format!("    {d}\n"));
            }
        }
        out
    }
}

fn wrong_kind(found: &OptionData, expected: &'static str) -> OptionError {
    OptionError::WrongKind {
        label: found.label().to_owned(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_with_default_category() {
        let tab = OptionsTab::new();
        assert_eq!(tab.categories().len(), 1);
        assert_eq!(tab.categories()[0].name(), DEFAULT_CATEGORY);
        assert!(tab.is_empty());
    }

    #[test]
    fn add_creates_missing_category_and_remove_drops_empty_one() {
        let mut tab = OptionsTab::new();
        let a = tab.add_option(DEFAULT_CATEGORY, OptionData::text("Test", "This is a test."));
        let b = tab.add_option("Debug", OptionData::toggle("Test Toggle", false, |_| {}));
        assert_eq!(tab.categories().len(), 2);
        assert_eq!(tab.category("Debug").unwrap().len(), 1);

        let removed = tab.remove_option(b).unwrap();
        assert_eq!(removed.label(), "Test Toggle");
        assert!(tab.category("Debug").is_none());
        assert_eq!(tab.get(a).unwrap().label(), "Test");

        assert_eq!(tab.remove_option(b).unwrap_err(), OptionError::UnknownOption(b));
    }

    #[test]
    fn toggle_fires_only_on_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut tab = OptionsTab::new();
        let id = tab.add_option(
            "Debug",
            OptionData::toggle("Wireframe", false, move |v| sink.borrow_mut().push(v)),
        );

        tab.set_toggle(id, true).unwrap();
        tab.set_toggle(id, true).unwrap();
        tab.set_toggle(id, false).unwrap();
        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(tab.trigger_action(id).is_err());
    }

    #[test]
    fn input_change_and_submit() {
        let submitted = Rc::new(RefCell::new(String::new()));
        let changed = Rc::new(RefCell::new(0));
        let (s, c) = (submitted.clone(), changed.clone());

        let mut tab = OptionsTab::new();
        let id = tab.add_option(
            DEFAULT_CATEGORY,
            OptionData::input("Name", move |v| *s.borrow_mut() = v.to_owned())
                .on_input_changed(move |_| *c.borrow_mut() += 1),
        );

        tab.set_input(id, "ke").unwrap();
        tab.set_input(id, "keystone").unwrap();
        tab.submit_input(id).unwrap();
        assert_eq!(*submitted.borrow(), "keystone");
        assert_eq!(*changed.borrow(), 2);
        assert_eq!(tab.find("name"), Some(id));
    }

    #[test]
    fn action_and_text_render() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let mut tab = OptionsTab::new();
        let go = tab.add_option(
            DEFAULT_CATEGORY,
            OptionData::action("Go", move || *h.borrow_mut() += 1),
        );
        let fps = tab.add_option("Engine", OptionData::text("Frame", "0"));

        tab.trigger_action(go).unwrap();
        tab.set_text(fps, "120").unwrap();
        assert_eq!(*hits.borrow(), 1);

        let out = tab.render();
        assert!(out.contains("- Default\n    <Go>\n"));
        assert!(out.contains("Frame: 120"));

        tab.set_collapsed("Engine", true);
        assert!(!tab.render().contains("Frame: 120"));
    }
}
