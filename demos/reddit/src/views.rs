//! Text views.
//!
//! `Layout` is the controller's root. It renders `Picker` and `Posts` through
//! the context, so neither receives selector data from its parent.

use ambit_core::{
    args, Context, Invocation, PropKind, PropMap, PropType, PropTypes, Value, View, ViewError,
};
use chrono::{DateTime, Utc};

use crate::state::Post;

/// Root view: picker, status line and posts.
#[derive(Debug, Clone)]
pub struct Layout {
    options: Vec<String>,
}

impl Layout {
    /// Layout offering `options` in the picker.
    pub fn new(options: Vec<String>) -> Self {
        Self { options }
    }

    /// Click handler of the refresh link.
    pub fn refresh(cx: &Context) -> Result<Invocation, ViewError> {
        Ok(cx.method("onRefresh")?.spawn(args![]))
    }
}

impl View for Layout {
    type Output = String;

    fn name(&self) -> &str {
        "Layout"
    }

    fn context_types(&self) -> PropTypes {
        PropTypes::new()
            .with("posts", PropType::array().required())
            .with("isFetching", PropType::bool().required())
            .with("lastUpdated", PropType::number())
            .with("onRefresh", PropType::func().required())
    }

    fn render(&self, _props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        let posts: Vec<Value> = cx.value_as("posts")?;
        let is_fetching: bool = cx.value_as("isFetching")?;
        let last_updated: Option<i64> = cx.value_as("lastUpdated")?;

        let mut options = PropMap::new();
        options.insert("options".into(), Value::from(self.options.clone()));
        let mut lines = vec![cx.render(&Picker, &options)?];

        let mut status = Vec::new();
        if let Some(time) = last_updated.and_then(DateTime::<Utc>::from_timestamp_millis) {
            status.push(format!("Last updated at {}.", time.format("%H:%M:%S")));
        }
        if !is_fetching {
            status.push("[Refresh]".to_string());
        }
        if !status.is_empty() {
            lines.push(status.join(" "));
        }

        if posts.is_empty() {
            lines.push(if is_fetching { "Loading..." } else { "Empty." }.to_string());
        } else {
            if is_fetching {
                lines.push("(refreshing)".to_string());
            }
            lines.push(cx.render(&Posts, &PropMap::new())?);
        }

        Ok(lines.join("\n"))
    }
}

/// Subreddit heading and option list.
#[derive(Debug, Clone, Copy)]
pub struct Picker;

impl Picker {
    /// Change handler of the option list.
    pub fn change(cx: &Context, reddit: &str) -> Result<Invocation, ViewError> {
        Ok(cx.method("onSelectReddit")?.spawn(args![reddit]))
    }
}

impl View for Picker {
    type Output = String;

    fn name(&self) -> &str {
        "Picker"
    }

    fn prop_types(&self) -> PropTypes {
        PropTypes::new().with("options", PropType::array_of(PropKind::String).required())
    }

    fn context_types(&self) -> PropTypes {
        PropTypes::new()
            .with("selectedReddit", PropType::string().required())
            .with("onSelectReddit", PropType::func().required())
    }

    fn render(&self, props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        let selected: String = cx.value_as("selectedReddit")?;
        let options = props
            .get("options")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(|option| {
                if option == selected {
                    format!("[{option}]")
                } else {
                    option.to_string()
                }
            })
            .collect::<Vec<_>>();

        Ok(format!("# {selected}\n{}", options.join(" | ")))
    }
}

/// Post titles.
#[derive(Debug, Clone, Copy)]
pub struct Posts;

impl View for Posts {
    type Output = String;

    fn name(&self) -> &str {
        "Posts"
    }

    fn context_types(&self) -> PropTypes {
        PropTypes::new().with("posts", PropType::array().required())
    }

    fn render(&self, _props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        let posts: Vec<Post> = cx.value_as("posts")?;
        Ok(posts
            .iter()
            .map(|post| format!("  - {}", post.title))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
