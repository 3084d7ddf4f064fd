//! Liquid template evaluator.
//!
//! Templates get the standard Liquid tags, blocks and filters plus the
//! subscription management tags `{% unsubscribe_url %}` and
//! `{% unsubscribe_link "text" %}`. Variables that do not resolve render as
//! nil instead of failing the slot. Evaluation is a pure function of the
//! template and the [`RenderContext`].

use std::collections::BTreeSet;
use std::io::Write;

use jsonwebtoken::{encode, EncodingKey, Header};
use liquid_core::error::ResultLiquidReplaceExt;
use liquid_core::model::{KString, KStringCow, KStringRef, ScalarCow, ValueCow, ValueView};
use liquid_core::parser::{self, ParseBlock, ParseFilter};
use liquid_core::runtime::{PartialStore, Registers, RuntimeBuilder, Template};
use liquid_core::{
    Expression, Language, Object, ParseTag, Renderable, Runtime, TagReflection, TagTokenIter,
};
use liquid_lib::stdlib;
use serde::Serialize;
use serde_json::Value;

use super::types::{EvalError, RenderContext};
use crate::secrets::SUBSCRIPTION_SECRET_NAME;

const SUBSCRIPTION_MANAGEMENT_PATH: &str = "/dashboard/public/subscription-management";
const DEFAULT_UNSUBSCRIBE_TEXT: &str = "unsubscribe";

/// Evaluates a single template string against a render context
pub trait TemplateEvaluator: Send + Sync {
    fn evaluate(
        &self,
        template: &str,
        markup: bool,
        context: &RenderContext,
    ) -> Result<String, EvalError>;
}

/// Default evaluator
#[derive(Clone)]
pub struct LiquidEvaluator {
    language: Language,
    public_base_url: String,
}

impl LiquidEvaluator {
    /// `public_base_url` prefixes subscription management links
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            language: language(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Subscription management link for the current recipient.
    ///
    /// `None` unless the subscription secret, a subscription group and the
    /// recipient identifier are all available.
    fn unsubscribe_url(&self, context: &RenderContext) -> Result<Option<String>, EvalError> {
        let Some(secret) = context.secrets.get(SUBSCRIPTION_SECRET_NAME) else {
            return Ok(None);
        };
        let Some(group) = context.subscription_group_id.as_deref() else {
            return Ok(None);
        };
        let Some(identifier) = context.identifier() else {
            return Ok(None);
        };

        let claims = SubscriptionClaims {
            w: &context.workspace_id,
            i: value_to_string(identifier),
            ik: &context.identifier_key,
            s: group,
            sub: false,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| EvalError::Token(e.to_string()))?;

        Ok(Some(format!(
            "{}{}?t={}",
            self.public_base_url.trim_end_matches('/'),
            SUBSCRIPTION_MANAGEMENT_PATH,
            token
        )))
    }
}

impl TemplateEvaluator for LiquidEvaluator {
    fn evaluate(
        &self,
        template: &str,
        markup: bool,
        context: &RenderContext,
    ) -> Result<String, EvalError> {
        let template = parser::parse(template, &self.language).map(Template::new)?;
        let globals = globals(context)?;
        let subscription = SubscriptionRegister {
            url: self.unsubscribe_url(context)?,
            markup,
        };

        let runtime = LenientRuntime(RuntimeBuilder::new().set_globals(&globals).build());
        *runtime.registers().get_mut::<SubscriptionRegister>() = subscription;

        Ok(template.render(&runtime)?)
    }
}

fn language() -> Language {
    let tags: Vec<Box<dyn ParseTag>> = vec![
        Box::new(stdlib::AssignTag),
        Box::new(stdlib::BreakTag),
        Box::new(stdlib::ContinueTag),
        Box::new(stdlib::CycleTag),
        Box::new(stdlib::IncrementTag),
        Box::new(stdlib::DecrementTag),
        Box::new(UnsubscribeUrlTag),
        Box::new(UnsubscribeLinkTag),
    ];
    let blocks: Vec<Box<dyn ParseBlock>> = vec![
        Box::new(stdlib::RawBlock),
        Box::new(stdlib::IfBlock),
        Box::new(stdlib::UnlessBlock),
        Box::new(stdlib::IfChangedBlock),
        Box::new(stdlib::ForBlock),
        Box::new(stdlib::TableRowBlock),
        Box::new(stdlib::CommentBlock),
        Box::new(stdlib::CaptureBlock),
        Box::new(stdlib::CaseBlock),
    ];
    let filters: Vec<Box<dyn ParseFilter>> = vec![
        Box::new(stdlib::Abs),
        Box::new(stdlib::Append),
        Box::new(stdlib::AtLeast),
        Box::new(stdlib::AtMost),
        Box::new(stdlib::Capitalize),
        Box::new(stdlib::Ceil),
        Box::new(stdlib::Compact),
        Box::new(stdlib::Concat),
        Box::new(stdlib::Date),
        Box::new(stdlib::Default),
        Box::new(stdlib::DividedBy),
        Box::new(stdlib::Downcase),
        Box::new(stdlib::Escape),
        Box::new(stdlib::EscapeOnce),
        Box::new(stdlib::First),
        Box::new(stdlib::Floor),
        Box::new(stdlib::Join),
        Box::new(stdlib::Last),
        Box::new(stdlib::Lstrip),
        Box::new(stdlib::Map),
        Box::new(stdlib::Minus),
        Box::new(stdlib::Modulo),
        Box::new(stdlib::NewlineToBr),
        Box::new(stdlib::Plus),
        Box::new(stdlib::Prepend),
        Box::new(stdlib::Remove),
        Box::new(stdlib::RemoveFirst),
        Box::new(stdlib::Replace),
        Box::new(stdlib::ReplaceFirst),
        Box::new(stdlib::Reverse),
        Box::new(stdlib::Round),
        Box::new(stdlib::Rstrip),
        Box::new(stdlib::Size),
        Box::new(stdlib::Slice),
        Box::new(stdlib::Sort),
        Box::new(stdlib::SortNatural),
        Box::new(stdlib::Split),
        Box::new(stdlib::Strip),
        Box::new(stdlib::StripHtml),
        Box::new(stdlib::StripNewlines),
        Box::new(stdlib::Times),
        Box::new(stdlib::Truncate),
        Box::new(stdlib::TruncateWords),
        Box::new(stdlib::Uniq),
        Box::new(stdlib::Upcase),
        Box::new(stdlib::UrlDecode),
        Box::new(stdlib::UrlEncode),
        Box::new(stdlib::Where),
    ];

    let mut language = Language::empty();
    for tag in tags {
        let name = tag.reflection().tag().to_owned();
        language.tags.register(name, tag);
    }
    for block in blocks {
        let name = block.reflection().start_tag().to_owned();
        language.blocks.register(name, block);
    }
    for filter in filters {
        let name = filter.reflection().name().to_owned();
        language.filters.register(name, filter);
    }
    language
}

/// Template scope: user properties at the top level, then the reserved roots.
/// Reserved roots win over user properties of the same name.
fn globals(context: &RenderContext) -> Result<Object, EvalError> {
    let mut scope = context.user_properties.clone();
    scope.insert(
        "user".to_string(),
        Value::Object(context.user_properties.clone()),
    );
    scope.insert(
        "workspace_id".to_string(),
        Value::String(context.workspace_id.clone()),
    );
    if let Some(group) = &context.subscription_group_id {
        scope.insert(
            "subscription_group_id".to_string(),
            Value::String(group.clone()),
        );
    }
    scope.insert(
        "identifier_key".to_string(),
        Value::String(context.identifier_key.clone()),
    );

    Ok(liquid_core::to_object(&scope)?)
}

/// Runtime that resolves unknown variables to nil
struct LenientRuntime<R>(R);

impl<R: Runtime> Runtime for LenientRuntime<R> {
    fn partials(&self) -> &dyn PartialStore {
        self.0.partials()
    }

    fn name(&self) -> Option<KStringRef<'_>> {
        self.0.name()
    }

    fn roots(&self) -> BTreeSet<KStringCow<'_>> {
        self.0.roots()
    }

    fn try_get(&self, path: &[ScalarCow<'_>]) -> Option<ValueCow<'_>> {
        self.0.try_get(path)
    }

    fn get(&self, path: &[ScalarCow<'_>]) -> liquid_core::Result<ValueCow<'_>> {
        Ok(self
            .0
            .try_get(path)
            .unwrap_or(ValueCow::Owned(liquid_core::Value::Nil)))
    }

    fn set_global(&self, name: KString, val: liquid_core::Value) -> Option<liquid_core::Value> {
        self.0.set_global(name, val)
    }

    fn set_index(&self, name: KString, val: liquid_core::Value) -> Option<liquid_core::Value> {
        self.0.set_index(name, val)
    }

    fn get_index<'a>(&'a self, name: &str) -> Option<ValueCow<'a>> {
        self.0.get_index(name)
    }

    fn registers(&self) -> &Registers {
        self.0.registers()
    }
}

/// Per-render state read by the subscription tags
#[derive(Debug, Default)]
struct SubscriptionRegister {
    url: Option<String>,
    markup: bool,
}

fn subscription_state(runtime: &dyn Runtime) -> (Option<String>, bool) {
    let register = runtime.registers().get_mut::<SubscriptionRegister>();
    (register.url.clone(), register.markup)
}

#[derive(Clone, Copy, Debug, Default)]
struct UnsubscribeUrlTag;

impl TagReflection for UnsubscribeUrlTag {
    fn tag(&self) -> &str {
        "unsubscribe_url"
    }

    fn description(&self) -> &str {
        "Subscription management URL for the recipient."
    }
}

impl ParseTag for UnsubscribeUrlTag {
    fn parse(
        &self,
        mut arguments: TagTokenIter<'_>,
        _options: &Language,
    ) -> liquid_core::Result<Box<dyn Renderable>> {
        arguments.expect_nothing()?;
        Ok(Box::new(UnsubscribeUrl))
    }

    fn reflection(&self) -> &dyn TagReflection {
        self
    }
}

#[derive(Debug)]
struct UnsubscribeUrl;

impl Renderable for UnsubscribeUrl {
    fn render_to(&self, writer: &mut dyn Write, runtime: &dyn Runtime) -> liquid_core::Result<()> {
        if let (Some(url), _) = subscription_state(runtime) {
            write!(writer, "{}", url).replace("Failed to render")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct UnsubscribeLinkTag;

impl TagReflection for UnsubscribeLinkTag {
    fn tag(&self) -> &str {
        "unsubscribe_link"
    }

    fn description(&self) -> &str {
        "Link to the recipient's subscription management page."
    }
}

impl ParseTag for UnsubscribeLinkTag {
    fn parse(
        &self,
        mut arguments: TagTokenIter<'_>,
        _options: &Language,
    ) -> liquid_core::Result<Box<dyn Renderable>> {
        let text = match arguments.next() {
            Some(token) => Some(token.expect_value().into_result()?),
            None => None,
        };
        arguments.expect_nothing()?;

        Ok(Box::new(UnsubscribeLink { text }))
    }

    fn reflection(&self) -> &dyn TagReflection {
        self
    }
}

#[derive(Debug)]
struct UnsubscribeLink {
    text: Option<Expression>,
}

impl Renderable for UnsubscribeLink {
    fn render_to(&self, writer: &mut dyn Write, runtime: &dyn Runtime) -> liquid_core::Result<()> {
        let text = match &self.text {
            Some(text) => text.evaluate(runtime)?.render().to_string(),
            None => DEFAULT_UNSUBSCRIBE_TEXT.to_string(),
        };

        // Plain-text slots get the bare URL
        let rendered = match subscription_state(runtime) {
            (Some(url), true) => format!(
                r#"<a class="df-unsubscribe" clicktracking=off href="{}" target="_blank">{}</a>"#,
                url,
                escape_html(&text)
            ),
            (Some(url), false) => url,
            (None, _) => text,
        };

        write!(writer, "{}", rendered).replace("Failed to render")?;
        Ok(())
    }
}

/// Claims carried by a subscription management token
#[derive(Debug, Serialize)]
struct SubscriptionClaims<'a> {
    /// Workspace
    w: &'a str,
    /// Identifier value
    i: String,
    /// Identifier key
    ik: &'a str,
    /// Subscription group
    s: &'a str,
    /// Target subscription state
    sub: bool,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(properties: Value) -> RenderContext {
        RenderContext {
            workspace_id: "ws-1".to_string(),
            subscription_group_id: None,
            user_properties: properties.as_object().cloned().unwrap_or_default(),
            identifier_key: "email".to_string(),
            secrets: Default::default(),
        }
    }

    fn render(template: &str, properties: Value) -> Result<String, EvalError> {
        LiquidEvaluator::new("https://app.example.com").evaluate(
            template,
            false,
            &context(properties),
        )
    }

    fn subscribed_context() -> RenderContext {
        let mut ctx = context(json!({"email": "a@b.co"}));
        ctx.subscription_group_id = Some("group-1".to_string());
        ctx.secrets
            .insert(SUBSCRIPTION_SECRET_NAME.to_string(), "top-secret".to_string());
        ctx
    }

    #[test]
    fn test_render_bare_variable() {
        let result = render("Hello {{name}}", json!({"name": "Ada"})).unwrap();
        assert_eq!(result, "Hello Ada");
    }

    #[test]
    fn test_render_user_path() {
        let result = render(
            "Hi {{ user.profile.first }} ({{ user.tags[1] }})",
            json!({"profile": {"first": "Grace"}, "tags": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(result, "Hi Grace (b)");
    }

    #[test]
    fn test_unknown_variable_renders_empty() {
        let result = render("[{{ missing }}][{{ user.missing.deep }}]", json!({})).unwrap();
        assert_eq!(result, "[][]");
    }

    #[test]
    fn test_reserved_roots_win_over_user_properties() {
        let result = render(
            "{{ workspace_id }}/{{ identifier_key }}",
            json!({"workspace_id": "spoofed", "identifier_key": "phone"}),
        )
        .unwrap();
        assert_eq!(result, "ws-1/email");
    }

    #[test]
    fn test_number_variable() {
        let result = render("You have {{ count }} items", json!({"count": 42})).unwrap();
        assert_eq!(result, "You have 42 items");
    }

    #[test]
    fn test_filters() {
        let result = render(
            "{{ name | default: 'friend' | upcase }} {{ city | capitalize | append: '!' }}",
            json!({"city": "paris"}),
        )
        .unwrap();
        assert_eq!(result, "FRIEND Paris!");

        let result = render(
            "{{ name | size }} {{ greeting | truncate: 8 }}",
            json!({"name": "Ada", "greeting": "Hello world"}),
        )
        .unwrap();
        assert_eq!(result, "3 Hello...");
    }

    #[test]
    fn test_control_flow() {
        let result = render(
            "{% assign greeting = 'Hi' %}{% if name %}{{ greeting }} {{ name }}{% endif %}\
             {% for tag in user.tags %}[{{ tag }}]{% endfor %}\
             {% unless vip %}!{% endunless %}",
            json!({"name": "Ada", "tags": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(result, "Hi Ada[a][b]!");
    }

    #[test]
    fn test_whitespace_control() {
        let result = render("a   {{- name -}}   b", json!({"name": "x"})).unwrap();
        assert_eq!(result, "axb");
    }

    #[test]
    fn test_unclosed_output_fails() {
        let err = render("Hello\n  {{ name", json!({})).unwrap_err();
        assert!(matches!(err, EvalError::Liquid(_)));
        assert!(err.to_string().starts_with("liquid: "));
    }

    #[test]
    fn test_unknown_filter_fails() {
        let err = render("{{ name | shout }}", json!({"name": "x"})).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("liquid: Unknown filter"));
        assert!(message.contains("shout"));
    }

    #[test]
    fn test_unknown_tag_fails() {
        let err = render("{% frobnicate %}", json!({})).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown tag"));
        assert!(message.contains("frobnicate"));
    }

    #[test]
    fn test_markup_does_not_escape_values() {
        let evaluator = LiquidEvaluator::new("https://app.example.com");
        let ctx = context(json!({"name": "<b>Ada</b>"}));

        let raw = evaluator.evaluate("<p>{{ name }}</p>", true, &ctx).unwrap();
        assert_eq!(raw, "<p><b>Ada</b></p>");

        let escaped = evaluator
            .evaluate("<p>{{ name | escape }}</p>", true, &ctx)
            .unwrap();
        assert_eq!(escaped, "<p>&lt;b&gt;Ada&lt;/b&gt;</p>");
    }

    #[test]
    fn test_unsubscribe_link_without_secret_renders_text() {
        let result =
            render("{% unsubscribe_link 'Opt out' %}", json!({"email": "a@b.co"})).unwrap();
        assert_eq!(result, "Opt out");
    }

    #[test]
    fn test_unsubscribe_tags_reject_extra_arguments() {
        assert!(render("{% unsubscribe_url 'x' %}", json!({})).is_err());
        assert!(render("{% unsubscribe_link 'a' 'b' %}", json!({})).is_err());
    }

    #[test]
    fn test_unsubscribe_url_signed_with_secret() {
        let evaluator = LiquidEvaluator::new("https://app.example.com/");
        let ctx = subscribed_context();

        let url = evaluator.evaluate("{% unsubscribe_url %}", false, &ctx).unwrap();
        assert!(url.starts_with(
            "https://app.example.com/dashboard/public/subscription-management?t="
        ));
        assert!(!url.contains("top-secret"));

        // Signing is deterministic
        let again = evaluator.evaluate("{% unsubscribe_url %}", false, &ctx).unwrap();
        assert_eq!(url, again);

        let link = evaluator.evaluate("{% unsubscribe_link %}", true, &ctx).unwrap();
        assert!(link.contains(&format!("href=\"{}\"", url)));
        assert!(link.ends_with(">unsubscribe</a>"));

        let plain = evaluator.evaluate("{% unsubscribe_link %}", false, &ctx).unwrap();
        assert_eq!(plain, url);
    }

    #[test]
    fn test_unsubscribe_link_text_is_escaped_in_markup() {
        let evaluator = LiquidEvaluator::new("https://app.example.com");
        let ctx = subscribed_context();

        let link = evaluator
            .evaluate("{% unsubscribe_link '<Stop>' %}", true, &ctx)
            .unwrap();
        assert!(link.ends_with(">&lt;Stop&gt;</a>"));
    }
}
