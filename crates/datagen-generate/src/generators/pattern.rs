use std::sync::Arc;

use async_trait::async_trait;

use datagen_core::{GeneratorOptions, Range, find_range_tokens, parse_range};

use crate::errors::GeneratorError;
use crate::generators::{CacheGenerator, Trail, ValueSource};

pub const PATTERN: &str = "pattern";

/// Free-text template whose embedded ranges are resampled on every draw.
///
/// `ID-0000..9999` yields values such as `ID-0042`: each range token found
/// in the template is swapped for a `{group_N}` placeholder (N counted from
/// 1, left to right) and rendered independently on each draw.
#[derive(Debug, Clone)]
pub struct PatternSource {
    template: String,
    compiled: String,
    groups: Vec<(String, Range)>,
}

pub type PatternGenerator = CacheGenerator<PatternSource>;

impl PatternSource {
    pub fn compile(template: &str) -> Result<Self, GeneratorError> {
        let mut compiled = String::with_capacity(template.len());
        let mut groups = Vec::new();
        let mut cursor = 0;
        for (index, token) in find_range_tokens(template).into_iter().enumerate() {
            let placeholder = format!("{{group_{}}}", index + 1);
            compiled.push_str(&template[cursor..token.start]);
            compiled.push_str(&placeholder);
            groups.push((placeholder, parse_range(&token.text)?));
            cursor = token.end;
        }
        compiled.push_str(&template[cursor..]);

        Ok(Self {
            template: template.to_string(),
            compiled,
            groups,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Template with every range replaced by its placeholder.
    pub fn compiled(&self) -> &str {
        &self.compiled
    }

    pub fn groups(&self) -> &[(String, Range)] {
        &self.groups
    }

    fn render(&self) -> String {
        let mut rng = rand::rng();
        let mut rendered = self.compiled.clone();
        for (placeholder, range) in &self.groups {
            rendered = rendered.replace(placeholder, &range.sample_padded(&mut rng));
        }
        rendered
    }
}

impl PatternGenerator {
    pub fn new(options: Arc<GeneratorOptions>, template: &str) -> Result<Self, GeneratorError> {
        Ok(Self::wrap(PATTERN, options, PatternSource::compile(template)?))
    }
}

#[async_trait]
impl ValueSource for PatternSource {
    async fn produce(&self, _trail: &mut Trail) -> Result<String, GeneratorError> {
        Ok(self.render())
    }
}
