use std::fmt;
use std::rc::Rc;

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::loader::AsyncLoad;
use crate::model::TreeFields;

/// Which prefix icon is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconKind {
    /// Expander in front of the row.
    Action,
    /// Folder/file marker in front of the label.
    NodeType,
}

/// Facts about a row handed to a custom icon resolver.
pub struct IconContext<'a, N> {
    pub is_root: bool,
    /// Has children or loads them on demand.
    pub expandable: bool,
    pub is_open: bool,
    pub kind: IconKind,
    pub node: &'a N,
}

/// A custom icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconValue {
    Text(String),
    Styled { text: String, style: Style },
    Prebuilt(Line<'static>),
}

impl IconValue {
    pub(crate) fn into_spans(self) -> Vec<Span<'static>> {
        match self {
            Self::Text(text) => vec![Span::raw(text)],
            Self::Styled { text, style } => vec![Span::styled(text, style)],
            Self::Prebuilt(line) => line.spans,
        }
    }
}

/// Answer of a custom icon resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconChoice {
    /// Use the built-in icon for this kind.
    Default,
    Hidden,
    Value(IconValue),
}

pub type IconFn<N> = dyn Fn(&IconContext<'_, N>) -> IconChoice;

/// Prefix icon configuration.
pub enum PrefixIcon<N> {
    /// No expander or node-type icons.
    Disabled,
    /// Built-in glyphs.
    Default,
    Custom(Rc<IconFn<N>>),
}

impl<N> PrefixIcon<N> {
    pub fn custom<F>(resolve: F) -> Self
    where
        F: Fn(&IconContext<'_, N>) -> IconChoice + 'static,
    {
        Self::Custom(Rc::new(resolve))
    }

    /// Resolves the icon for `ctx`; `Default` means "use the built-in glyph".
    pub(crate) fn resolve(&self, ctx: &IconContext<'_, N>) -> IconChoice {
        match self {
            Self::Disabled => IconChoice::Hidden,
            Self::Default => IconChoice::Default,
            Self::Custom(resolve) => resolve(ctx),
        }
    }
}

impl<N> From<bool> for PrefixIcon<N> {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Default } else { Self::Disabled }
    }
}

impl<N> Clone for PrefixIcon<N> {
    fn clone(&self) -> Self {
        match self {
            Self::Disabled => Self::Disabled,
            Self::Default => Self::Default,
            Self::Custom(resolve) => Self::Custom(Rc::clone(resolve)),
        }
    }
}

impl<N> fmt::Debug for PrefixIcon<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Default => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Behavioral configuration of the tree.
pub struct TreeOptions<N> {
    pub fields: TreeFields<'static>,
    /// Terminal rows per tree row.
    pub line_height: u16,
    /// Build only the rows inside the viewport.
    pub virtual_render: bool,
    /// Draw connector lines between depth levels.
    pub level_line: bool,
    pub prefix_icon: PrefixIcon<N>,
    pub async_load: Option<AsyncLoad<N>>,
}

impl<N> Default for TreeOptions<N> {
    fn default() -> Self {
        Self {
            fields: TreeFields::new(),
            line_height: 1,
            virtual_render: true,
            level_line: false,
            prefix_icon: PrefixIcon::Default,
            async_load: None,
        }
    }
}

impl<N> TreeOptions<N> {
    #[must_use]
    pub const fn fields(mut self, fields: TreeFields<'static>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the row height; zero is treated as one.
    #[must_use]
    pub fn line_height(mut self, line_height: u16) -> Self {
        self.line_height = line_height.max(1);
        self
    }

    #[must_use]
    pub const fn virtual_render(mut self, enabled: bool) -> Self {
        self.virtual_render = enabled;
        self
    }

    #[must_use]
    pub const fn level_line(mut self, enabled: bool) -> Self {
        self.level_line = enabled;
        self
    }

    #[must_use]
    pub fn prefix_icon(mut self, prefix_icon: impl Into<PrefixIcon<N>>) -> Self {
        self.prefix_icon = prefix_icon.into();
        self
    }

    #[must_use]
    pub fn async_load(mut self, async_load: AsyncLoad<N>) -> Self {
        self.async_load = Some(async_load);
        self
    }
}

impl<N> Clone for TreeOptions<N> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields,
            line_height: self.line_height,
            virtual_render: self.virtual_render,
            level_line: self.level_line,
            prefix_icon: self.prefix_icon.clone(),
            async_load: self.async_load.clone(),
        }
    }
}

impl<N> fmt::Debug for TreeOptions<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions")
            .field("fields", &self.fields)
            .field("line_height", &self.line_height)
            .field("virtual_render", &self.virtual_render)
            .field("level_line", &self.level_line)
            .field("prefix_icon", &self.prefix_icon)
            .field("async_load", &self.async_load)
            .finish()
    }
}
