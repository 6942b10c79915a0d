//! Core options exposed to the frontend
//!
//! Each option is declared once with an immutable default and a domain.
//! The frontend owns the stored values; `refresh` pulls the current value
//! through the environment and raises the option's updated flag when it
//! changed. A locked option keeps the value it had when it was locked and
//! ignores later edits until it is unlocked again.

use crate::host::{Environment, VariableDescriptor};
use std::fmt;

/// A labelled entry of a choice option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown by the frontend
    pub label: String,
    /// Value the core works with
    pub value: String,
}

/// Permitted values of an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDomain {
    /// `enabled` / `disabled`
    Toggle,
    /// Inclusive integer range
    Range { min: i32, max: i32 },
    /// Ordered set of labelled choices
    Choices(Vec<Choice>),
}

/// Values an option can hold
pub trait OptionValue: Clone + PartialEq + fmt::Debug {
    /// Parse a frontend string, rejecting anything outside `domain`
    fn parse(raw: &str, domain: &OptionDomain) -> Option<Self>;

    /// Frontend string for this value
    fn label(&self, domain: &OptionDomain) -> String;
}

impl OptionValue for bool {
    fn parse(raw: &str, _domain: &OptionDomain) -> Option<Self> {
        match raw {
            "enabled" | "true" => Some(true),
            "disabled" | "false" => Some(false),
            _ => None,
        }
    }

    fn label(&self, _domain: &OptionDomain) -> String {
        let label = if *self { "enabled" } else { "disabled" };
        label.to_string()
    }
}

impl OptionValue for i32 {
    fn parse(raw: &str, domain: &OptionDomain) -> Option<Self> {
        let value: i32 = raw.trim().parse().ok()?;
        match domain {
            OptionDomain::Range { min, max } if (*min..=*max).contains(&value) => Some(value),
            OptionDomain::Range { .. } => None,
            _ => Some(value),
        }
    }

    fn label(&self, _domain: &OptionDomain) -> String {
        self.to_string()
    }
}

impl OptionValue for String {
    fn parse(raw: &str, domain: &OptionDomain) -> Option<Self> {
        match domain {
            OptionDomain::Choices(choices) => choices
                .iter()
                .find(|c| c.label == raw)
                .map(|c| c.value.clone()),
            _ => Some(raw.to_string()),
        }
    }

    fn label(&self, domain: &OptionDomain) -> String {
        match domain {
            OptionDomain::Choices(choices) => choices
                .iter()
                .find(|c| &c.value == self)
                .map(|c| c.label.clone())
                .unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }
}

/// A single frontend-editable option
#[derive(Debug, Clone)]
pub struct CoreOption<T: OptionValue> {
    key: &'static str,
    label: &'static str,
    default: T,
    domain: OptionDomain,
    value: T,
    updated: bool,
    locked: bool,
}

impl<T: OptionValue> CoreOption<T> {
    fn with_domain(key: &'static str, label: &'static str, default: T, domain: OptionDomain) -> Self {
        Self {
            key,
            label,
            value: default.clone(),
            default,
            domain,
            updated: false,
            locked: false,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Current effective value
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn domain(&self) -> &OptionDomain {
        &self.domain
    }

    /// Pull the frontend's value. Returns `true` if the effective value changed.
    pub fn refresh(&mut self, env: &dyn Environment) -> bool {
        let Some(raw) = env.get_variable(self.key) else {
            return false;
        };

        let Some(parsed) = T::parse(&raw, &self.domain) else {
            tracing::warn!("Ignoring invalid value '{}' for option {}", raw, self.key);
            return false;
        };

        if parsed == self.value {
            return false;
        }

        if self.locked {
            tracing::debug!(
                "Option {} is locked, keeping {:?} (frontend has '{}')",
                self.key,
                self.value,
                raw
            );
            return false;
        }

        tracing::debug!("Option {} changed: {:?} -> {:?}", self.key, self.value, parsed);
        self.value = parsed;
        self.updated = true;
        true
    }

    /// Whether the value changed since the last call. Clears the flag.
    pub fn take_updated(&mut self) -> bool {
        std::mem::take(&mut self.updated)
    }

    /// Read the frontend's value one last time, then freeze it
    pub fn update_and_lock(&mut self, env: &dyn Environment) {
        self.refresh(env);
        self.lock();
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Descriptor announced to the frontend; the default comes first.
    ///
    /// Returns `None` for a choice option with no choices.
    pub fn descriptor(&self) -> Option<VariableDescriptor> {
        let default_label = self.default.label(&self.domain);
        let mut labels = vec![default_label.clone()];

        match &self.domain {
            OptionDomain::Toggle => {
                labels.push(if default_label == "enabled" { "disabled" } else { "enabled" }.to_string());
            }
            OptionDomain::Range { min, max } => {
                labels.extend((*min..=*max).map(|v| v.to_string()).filter(|l| *l != default_label));
            }
            OptionDomain::Choices(choices) => {
                if choices.is_empty() {
                    return None;
                }
                labels.extend(
                    choices
                        .iter()
                        .map(|c| c.label.clone())
                        .filter(|l| *l != default_label),
                );
            }
        }

        Some(VariableDescriptor {
            key: self.key.to_string(),
            value: format!("{}; {}", self.label, labels.join("|")),
        })
    }
}

impl CoreOption<bool> {
    pub fn toggle(key: &'static str, label: &'static str, default: bool) -> Self {
        Self::with_domain(key, label, default, OptionDomain::Toggle)
    }
}

impl CoreOption<i32> {
    pub fn range(key: &'static str, label: &'static str, default: i32, min: i32, max: i32) -> Self {
        debug_assert!((min..=max).contains(&default));
        Self::with_domain(key, label, default, OptionDomain::Range { min, max })
    }
}

impl CoreOption<String> {
    /// Choice option whose labels are also its values
    pub fn choices(key: &'static str, label: &'static str, labels: &[&str], default: &str) -> Self {
        let choices = labels
            .iter()
            .map(|l| Choice {
                label: l.to_string(),
                value: l.to_string(),
            })
            .collect();
        Self::with_domain(key, label, default.to_string(), OptionDomain::Choices(choices))
    }

    /// Choice option populated at runtime with `push_choice`
    pub fn empty_choices(key: &'static str, label: &'static str) -> Self {
        Self::with_domain(key, label, String::new(), OptionDomain::Choices(Vec::new()))
    }

    /// Append a choice. The first choice pushed becomes the default.
    pub fn push_choice(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let choice = Choice {
            label: label.into(),
            value: value.into(),
        };
        if let OptionDomain::Choices(choices) = &mut self.domain {
            if choices.is_empty() {
                self.default = choice.value.clone();
                self.value = choice.value.clone();
            }
            choices.push(choice);
        }
    }

    pub fn has_choices(&self) -> bool {
        matches!(&self.domain, OptionDomain::Choices(c) if !c.is_empty())
    }
}

/// Renderer backend selected by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Auto,
    D3D11,
    OpenGl,
    Software,
    Null,
}

impl Renderer {
    /// Labels offered on this platform, in announcement order
    pub fn labels() -> &'static [&'static str] {
        #[cfg(windows)]
        {
            &["Auto", "D3D11", "OpenGL", "Software", "Null"]
        }
        #[cfg(not(windows))]
        {
            &["Auto", "OpenGL", "Software", "Null"]
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Auto" => Some(Self::Auto),
            "D3D11" => Some(Self::D3D11),
            "OpenGL" => Some(Self::OpenGl),
            "Software" => Some(Self::Software),
            "Null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Renderers that draw at native resolution regardless of upscaling
    pub fn is_native_only(self) -> bool {
        matches!(self, Self::Software | Self::Null)
    }
}

/// The full option set of the core
#[derive(Debug, Clone)]
pub struct CoreOptions {
    /// BIOS image, filled from the discovery scan
    pub bios: CoreOption<String>,
    pub fast_boot: CoreOption<bool>,
    /// Locked while a game is loaded
    pub renderer: CoreOption<String>,
    pub frameskip: CoreOption<bool>,
    pub frames_to_draw: CoreOption<i32>,
    pub frames_to_skip: CoreOption<i32>,
    pub upscale_multiplier: CoreOption<i32>,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreOptions {
    pub fn new() -> Self {
        Self {
            bios: CoreOption::empty_choices("pcsx2_bios", "Bios"),
            fast_boot: CoreOption::toggle("pcsx2_fastboot", "Fast Boot", true),
            renderer: CoreOption::choices("pcsx2_renderer", "Renderer", Renderer::labels(), "Auto"),
            frameskip: CoreOption::toggle("pcsx2_frameskip", "Frameskip", false),
            frames_to_draw: CoreOption::range("pcsx2_frames_to_draw", "Frameskip: Frames to Draw", 1, 1, 10),
            frames_to_skip: CoreOption::range("pcsx2_frames_to_skip", "Frameskip: Frames to Skip", 1, 1, 10),
            upscale_multiplier: CoreOption::range("pcsx2_upscale_multiplier", "Internal Resolution", 1, 1, 8),
        }
    }

    /// Descriptors of every announceable option, in declaration order
    pub fn descriptors(&self) -> Vec<VariableDescriptor> {
        [
            self.bios.descriptor(),
            self.fast_boot.descriptor(),
            self.renderer.descriptor(),
            self.frameskip.descriptor(),
            self.frames_to_draw.descriptor(),
            self.frames_to_skip.descriptor(),
            self.upscale_multiplier.descriptor(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Announce all options to the frontend
    pub fn set_variables(&self, env: &dyn Environment) -> bool {
        env.set_variables(&self.descriptors())
    }

    /// Re-read every option from the frontend
    pub fn check_variables(&mut self, env: &dyn Environment) {
        self.bios.refresh(env);
        self.fast_boot.refresh(env);
        self.renderer.refresh(env);
        self.frameskip.refresh(env);
        self.frames_to_draw.refresh(env);
        self.frames_to_skip.refresh(env);
        self.upscale_multiplier.refresh(env);
    }

    /// Effective renderer; unknown labels fall back to `Auto`
    pub fn renderer(&self) -> Renderer {
        Renderer::from_label(self.renderer.get()).unwrap_or(Renderer::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Default)]
    struct VarEnv {
        vars: Mutex<HashMap<String, String>>,
    }

    impl VarEnv {
        fn set(&self, key: &str, value: &str) {
            self.vars.lock().insert(key.to_string(), value.to_string());
        }
    }

    impl Environment for VarEnv {
        fn set_pixel_format(&self, _format: PixelFormat) -> bool {
            true
        }
        fn log_interface(&self) -> Option<Arc<dyn LogSink>> {
            None
        }
        fn system_directory(&self) -> Option<PathBuf> {
            None
        }
        fn save_directory(&self) -> Option<PathBuf> {
            None
        }
        fn set_hw_render(&self, _request: &HwRenderRequest) -> bool {
            false
        }
        fn preferred_hw_render(&self) -> Option<HwContextKind> {
            None
        }
        fn set_variables(&self, _variables: &[VariableDescriptor]) -> bool {
            true
        }
        fn get_variable(&self, key: &str) -> Option<String> {
            self.vars.lock().get(key).cloned()
        }
        fn set_system_av_info(&self, _info: &SystemAvInfo) -> bool {
            true
        }
        fn set_disk_control(&self) -> bool {
            true
        }
        fn set_support_no_game(&self, _supported: bool) -> bool {
            true
        }
    }

    #[test]
    fn test_defaults() {
        let options = CoreOptions::new();
        assert!(*options.fast_boot.get());
        assert!(!*options.frameskip.get());
        assert_eq!(*options.frames_to_draw.get(), 1);
        assert_eq!(*options.upscale_multiplier.get(), 1);
        assert_eq!(options.renderer(), Renderer::Auto);
        assert!(!options.bios.has_choices());
    }

    #[test]
    fn test_descriptor_default_first() {
        let toggle = CoreOption::toggle("k", "Fast Boot", true);
        assert_eq!(toggle.descriptor().unwrap().value, "Fast Boot; enabled|disabled");

        let range = CoreOption::range("k", "Scale", 2, 1, 4);
        assert_eq!(range.descriptor().unwrap().value, "Scale; 2|1|3|4");

        let choice = CoreOption::choices("k", "Renderer", &["Auto", "OpenGL", "Null"], "OpenGL");
        assert_eq!(choice.descriptor().unwrap().value, "Renderer; OpenGL|Auto|Null");
    }

    #[test]
    fn test_empty_choices_not_announced() {
        let options = CoreOptions::new();
        let keys: Vec<_> = options.descriptors().into_iter().map(|d| d.key).collect();
        assert!(!keys.contains(&"pcsx2_bios".to_string()));
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn test_refresh_sets_and_clears_updated() {
        let env = VarEnv::default();
        let mut scale = CoreOption::range("scale", "Scale", 1, 1, 8);

        env.set("scale", "3");
        assert!(scale.refresh(&env));
        assert_eq!(*scale.get(), 3);
        assert!(scale.take_updated());
        assert!(!scale.take_updated());

        // Same value again is not an update
        assert!(!scale.refresh(&env));
        assert!(!scale.take_updated());
    }

    #[test]
    fn test_out_of_range_ignored() {
        let env = VarEnv::default();
        let mut scale = CoreOption::range("scale", "Scale", 1, 1, 8);
        env.set("scale", "12");
        assert!(!scale.refresh(&env));
        assert_eq!(*scale.get(), 1);

        env.set("scale", "banana");
        assert!(!scale.refresh(&env));
        assert_eq!(*scale.get(), 1);
    }

    #[test]
    fn test_locked_option_ignores_edits() {
        let env = VarEnv::default();
        let mut options = CoreOptions::new();

        env.set("pcsx2_renderer", "Null");
        options.renderer.update_and_lock(&env);
        assert_eq!(options.renderer(), Renderer::Null);
        assert!(options.renderer.is_locked());

        env.set("pcsx2_renderer", "Software");
        options.check_variables(&env);
        assert_eq!(options.renderer(), Renderer::Null);
        assert!(options.renderer.take_updated());
        assert!(!options.renderer.take_updated());

        options.renderer.unlock();
        options.check_variables(&env);
        assert_eq!(options.renderer(), Renderer::Software);
    }

    #[test]
    fn test_choice_label_maps_to_value() {
        let env = VarEnv::default();
        let mut bios = CoreOption::empty_choices("pcsx2_bios", "Bios");
        bios.push_choice("USA v02.00(14/06/2004) Console", "/bios/a.bin");
        bios.push_choice("Europe v02.00(14/06/2004) Console", "/bios/b.bin");
        assert_eq!(bios.get(), "/bios/a.bin");

        env.set("pcsx2_bios", "Europe v02.00(14/06/2004) Console");
        bios.refresh(&env);
        assert_eq!(bios.get(), "/bios/b.bin");
        assert_eq!(
            bios.descriptor().unwrap().value,
            "Bios; USA v02.00(14/06/2004) Console|Europe v02.00(14/06/2004) Console"
        );
    }

    #[test]
    fn test_renderer_labels() {
        assert!(Renderer::labels().contains(&"OpenGL"));
        assert_eq!(Renderer::from_label("Software"), Some(Renderer::Software));
        assert!(Renderer::Null.is_native_only());
        assert!(!Renderer::OpenGl.is_native_only());
    }
}
