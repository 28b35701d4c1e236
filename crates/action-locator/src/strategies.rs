//! Element resolution strategies
//!
//! Each strategy renders one target tag into a JavaScript expression that
//! evaluates to an array of elements in document order. Nothing is looked up
//! here; the adapter evaluates the expression whenever it needs the element.

use cdp_adapter::{js_string, ElementQuery};
use tracewalk_core_types::TargetSpec;

use crate::types::LocatorStrategy;

/// Renders a target into a query, or declines if the tag is not its own.
pub trait Strategy: Send + Sync {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery>;

    fn strategy_type(&self) -> LocatorStrategy;

    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Whitespace normalization shared by every text comparison.
const NORMALIZE_JS: &str = "const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim();";

/// Explicit role, else the implicit role of the tag.
const ROLE_JS: &str = r#"const roleOf = (el) => {
    const explicit = (el.getAttribute('role') || '').trim().split(/\s+/)[0];
    if (explicit) { return explicit.toLowerCase(); }
    const tag = el.tagName.toLowerCase();
    const type = (el.getAttribute('type') || 'text').toLowerCase();
    switch (tag) {
      case 'a': case 'area': return el.hasAttribute('href') ? 'link' : '';
      case 'button': case 'summary': return 'button';
      case 'input':
        if (['button', 'submit', 'reset', 'image'].includes(type)) { return 'button'; }
        if (type === 'checkbox') { return 'checkbox'; }
        if (type === 'radio') { return 'radio'; }
        if (type === 'range') { return 'slider'; }
        if (type === 'number') { return 'spinbutton'; }
        if (type === 'search') { return 'searchbox'; }
        if (type === 'hidden') { return ''; }
        return 'textbox';
      case 'textarea': return 'textbox';
      case 'select': return (el.multiple || el.size > 1) ? 'listbox' : 'combobox';
      case 'option': return 'option';
      case 'img': return el.getAttribute('alt') === '' ? 'presentation' : 'img';
      case 'h1': case 'h2': case 'h3': case 'h4': case 'h5': case 'h6': return 'heading';
      case 'ul': case 'ol': return 'list';
      case 'li': return 'listitem';
      case 'nav': return 'navigation';
      case 'main': return 'main';
      case 'dialog': return 'dialog';
      case 'form': return 'form';
      case 'table': return 'table';
      case 'tr': return 'row';
      case 'td': return 'cell';
      case 'th': return 'columnheader';
      case 'header': return 'banner';
      case 'footer': return 'contentinfo';
      case 'aside': return 'complementary';
      case 'progress': return 'progressbar';
      case 'hr': return 'separator';
    }
    return el.isContentEditable ? 'textbox' : '';
  };"#;

/// Accessible name: aria-label, aria-labelledby, associated labels,
/// alt/title, button values, then text content.
const NAME_JS: &str = r#"const nameOf = (el) => {
    const label = el.getAttribute('aria-label');
    if (label && label.trim()) { return norm(label); }
    const ids = el.getAttribute('aria-labelledby');
    if (ids) {
      const text = norm(ids.split(/\s+/).map((id) => document.getElementById(id)).filter(Boolean).map((n) => n.textContent).join(' '));
      if (text) { return text; }
    }
    if (el.labels && el.labels.length) {
      const text = norm(Array.from(el.labels).map((l) => l.textContent).join(' '));
      if (text) { return text; }
    }
    for (const attr of ['alt', 'title']) {
      const value = el.getAttribute(attr);
      if (value && value.trim()) { return norm(value); }
    }
    const tag = el.tagName.toLowerCase();
    if (tag === 'input') {
      const type = (el.getAttribute('type') || '').toLowerCase();
      if (['button', 'submit', 'reset'].includes(type)) { return norm(el.value); }
      return norm(el.getAttribute('placeholder'));
    }
    if (tag === 'textarea') { return norm(el.getAttribute('placeholder')); }
    return norm(el.innerText || el.textContent);
  };"#;

fn iife(body: &str) -> String {
    format!("(() => {{\n  {body}\n}})()")
}

fn role_candidates(role: &str, test: &str) -> String {
    iife(&format!(
        "{NORMALIZE_JS}\n  {ROLE_JS}\n  {NAME_JS}\n  {test}\n  const role = {role};\n  return Array.from(document.querySelectorAll('*')).filter((el) => roleOf(el) === role && matches(nameOf(el)));",
        role = js_string(&role.trim().to_ascii_lowercase()),
    ))
}

/// Plain `querySelectorAll`; navigation URLs in the css slot resolve to root.
pub struct CssStrategy;

impl Strategy for CssStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        match target {
            TargetSpec::Css(selector) if target.navigation_url().is_none() => {
                Some(ElementQuery::css(selector))
            }
            _ => None,
        }
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Css
    }
}

/// Role filter plus a case-insensitive regex search over the accessible
/// name. An invalid pattern degrades to a literal substring test.
pub struct RolePatternStrategy;

impl Strategy for RolePatternStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::RoleNamePattern { role, pattern } = target else {
            return None;
        };
        let test = format!(
            "const pattern = {pattern};\n  let matches;\n  try {{ const re = new RegExp(pattern, 'i'); matches = (name) => re.test(name); }}\n  catch (_) {{ const needle = pattern.toLowerCase(); matches = (name) => name.toLowerCase().includes(needle); }}",
            pattern = js_string(pattern),
        );
        Some(ElementQuery::new(
            role_candidates(role, &test),
            format!("role={role}[name~=/{pattern}/i]"),
        ))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::RolePattern
    }
}

/// Role filter plus whole-name equality after normalization, ignoring case.
pub struct RoleNameStrategy;

impl Strategy for RoleNameStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::RoleName { role, name } = target else {
            return None;
        };
        let test = format!(
            "const expected = norm({name}).toLowerCase();\n  const matches = (candidate) => candidate.toLowerCase() === expected;",
            name = js_string(name),
        );
        Some(ElementQuery::new(
            role_candidates(role, &test),
            format!("role={role}[name=\"{name}\"]"),
        ))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::RoleName
    }
}

/// Innermost elements whose text contains the target.
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::Text(text) = target else {
            return None;
        };
        let body = format!(
            r#"{NORMALIZE_JS}
  const needle = norm({text}).toLowerCase();
  if (!needle || !document.body) {{ return []; }}
  const skip = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
  const hits = Array.from(document.body.querySelectorAll('*'))
    .filter((el) => !skip.has(el.tagName) && norm(el.textContent).toLowerCase().includes(needle));
  return hits.filter((el) => !hits.some((other) => other !== el && el.contains(other)));"#,
            text = js_string(text),
        );
        Some(ElementQuery::new(iife(&body), format!("text={text}")))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Text
    }
}

pub struct PlaceholderStrategy;

impl Strategy for PlaceholderStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::Placeholder(text) = target else {
            return None;
        };
        let body = format!(
            "const needle = {text}.toLowerCase();\n  return Array.from(document.querySelectorAll('[placeholder]')).filter((el) => (el.getAttribute('placeholder') || '').toLowerCase().includes(needle));",
            text = js_string(text.trim()),
        );
        Some(ElementQuery::new(iife(&body), format!("placeholder={text}")))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Placeholder
    }
}

/// Controls named by a `<label>` (explicit `for=` or nesting), then
/// elements whose `aria-label` contains the text.
pub struct LabelStrategy;

impl Strategy for LabelStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::Label(text) = target else {
            return None;
        };
        let body = format!(
            r#"{NORMALIZE_JS}
  const needle = norm({text}).toLowerCase();
  const found = [];
  const push = (el) => {{ if (el && !found.includes(el)) {{ found.push(el); }} }};
  for (const label of document.querySelectorAll('label')) {{
    if (!norm(label.textContent).toLowerCase().includes(needle)) {{ continue; }}
    if (label.control) {{ push(label.control); }}
    else if (label.htmlFor) {{ push(document.getElementById(label.htmlFor)); }}
    else {{ push(label.querySelector('input, textarea, select')); }}
  }}
  for (const el of document.querySelectorAll('[aria-label]')) {{
    if (norm(el.getAttribute('aria-label')).toLowerCase().includes(needle)) {{ push(el); }}
  }}
  return found;"#,
            text = js_string(text),
        );
        Some(ElementQuery::new(iife(&body), format!("label={text}")))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Label
    }
}

/// Ordered snapshot of element nodes; a malformed expression matches nothing.
pub struct XPathStrategy;

impl Strategy for XPathStrategy {
    fn query(&self, target: &TargetSpec) -> Option<ElementQuery> {
        let TargetSpec::XPath(expr) = target else {
            return None;
        };
        let body = format!(
            r#"try {{
    const snap = document.evaluate({expr}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const found = [];
    for (let i = 0; i < snap.snapshotLength; i++) {{
      const node = snap.snapshotItem(i);
      if (node && node.nodeType === Node.ELEMENT_NODE) {{ found.push(node); }}
    }}
    return found;
  }} catch (_) {{ return []; }}"#,
            expr = js_string(expr),
        );
        Some(ElementQuery::new(iife(&body), format!("xpath={expr}")))
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::XPath
    }
}

/// The document itself. Accepts every target, so it closes the chain.
pub struct RootStrategy;

impl RootStrategy {
    pub fn root_query() -> ElementQuery {
        ElementQuery::new(
            "[document.body || document.documentElement].filter(Boolean)",
            "root",
        )
    }
}

impl Strategy for RootStrategy {
    fn query(&self, _target: &TargetSpec) -> Option<ElementQuery> {
        Some(Self::root_query())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Root
    }
}
