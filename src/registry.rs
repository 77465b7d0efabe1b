//! The registry tree: context, models, layouts, variants and option groups.
//!
//! Every entity is a cheap-to-clone handle over reference-counted data.
//! Cloning a handle keeps its entity alive independently of the context;
//! sibling iteration (`next`) resolves through a weak link to the owning
//! parent and yields `None` once the parent is gone. The tree is populated
//! by a single parse pass and is immutable afterwards.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::collection::Children;
use crate::grammar::{self, Sections};
use crate::link::Link;
use crate::paths::{self, SystemEnv};
use crate::{RegistryError, Result, DEFAULT_RULESET};

pub(crate) struct ContextData {
    includes: RefCell<Vec<PathBuf>>,
    models: Children<Model>,
    layouts: Children<Layout>,
    option_groups: Children<OptionGroup>,
    parsed: Cell<bool>,
    user_data: RefCell<Option<Rc<dyn Any>>>,
}

/// Top-level registry context.
///
/// Holds the include paths and, after a successful [`parse`](Context::parse),
/// the registry tree. Each context is independent; contexts share no state.
#[derive(Clone)]
pub struct Context {
    data: Rc<ContextData>,
}

impl Context {
    /// Create a context with the default include paths appended.
    ///
    /// Fails with [`RegistryError::NoIncludePath`] if none of the default
    /// candidates is a usable directory.
    pub fn new() -> Result<Self> {
        let ctx = Self::with_no_default_includes();
        ctx.include_path_append_default()?;
        Ok(ctx)
    }

    /// Create a context with an empty include path list.
    pub fn with_no_default_includes() -> Self {
        Self {
            data: Rc::new(ContextData {
                includes: RefCell::new(Vec::new()),
                models: Children::new(),
                layouts: Children::new(),
                option_groups: Children::new(),
                parsed: Cell::new(false),
                user_data: RefCell::new(None),
            }),
        }
    }

    /// Append one include path.
    ///
    /// The path must be an existing, readable directory; otherwise nothing
    /// is appended and [`RegistryError::InaccessiblePath`] is returned.
    /// Paths are not deduplicated.
    pub fn include_path_append<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !paths::is_searchable_dir(path) {
            return Err(RegistryError::InaccessiblePath(path.to_path_buf()));
        }
        self.data.includes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    /// Append the default include paths, in order: `$XDG_CONFIG_HOME/xkb`
    /// (or `$HOME/.config/xkb`), `$HOME/.xkb`, then `$XKB_CONFIG_ROOT` (or
    /// the compiled-in root). Unusable candidates are dropped silently;
    /// succeeds if at least one was appended.
    pub fn include_path_append_default(&self) -> Result<()> {
        let mut appended = false;
        for candidate in paths::default_candidates(&SystemEnv) {
            match self.include_path_append(&candidate) {
                Ok(()) => appended = true,
                Err(_) => debug!("dropping unusable include path {}", candidate.display()),
            }
        }
        if appended {
            Ok(())
        } else {
            Err(RegistryError::NoIncludePath)
        }
    }

    /// The include paths accepted so far, in search order.
    pub fn include_paths(&self) -> Vec<PathBuf> {
        self.data.includes.borrow().clone()
    }

    /// Parse the named ruleset.
    ///
    /// Tries `<dir>/rules/<ruleset>.xml` for each include path in order and
    /// populates the registry from the first file that parses as an XML
    /// document, even if no entities could be extracted from it. A context
    /// can be parsed at most once; the tree never changes afterwards.
    pub fn parse(&self, ruleset: &str) -> Result<()> {
        if self.data.parsed.get() {
            return Err(RegistryError::AlreadyParsed);
        }

        for dir in self.include_paths() {
            let file = dir.join("rules").join(format!("{ruleset}.xml"));
            let text = match fs::read_to_string(&file) {
                Ok(text) => text,
                Err(err) => {
                    debug!("skipping {}: {}", file.display(), err);
                    continue;
                }
            };
            match grammar::parse_document(&text) {
                Ok(sections) => {
                    debug!("parsed ruleset from {}", file.display());
                    self.attach(sections);
                    self.data.parsed.set(true);
                    return Ok(());
                }
                Err(err) => {
                    debug!("skipping {}: {}", file.display(), err);
                }
            }
        }

        Err(RegistryError::RulesetNotFound(ruleset.to_string()))
    }

    /// Parse the conventional default ruleset.
    pub fn parse_default_ruleset(&self) -> Result<()> {
        self.parse(DEFAULT_RULESET)
    }

    /// Attach one user-supplied value to the context. The library never
    /// looks at it; [`user_data`](Context::user_data) returns it as stored.
    pub fn set_user_data(&self, data: Rc<dyn Any>) {
        *self.data.user_data.borrow_mut() = Some(data);
    }

    pub fn user_data(&self) -> Option<Rc<dyn Any>> {
        self.data.user_data.borrow().clone()
    }

    /// The first model, in document order.
    pub fn model_first(&self) -> Option<Model> {
        self.data.models.first()
    }

    /// The first layout, in document order.
    pub fn layout_first(&self) -> Option<Layout> {
        self.data.layouts.first()
    }

    /// The first option group, in document order.
    pub fn option_group_first(&self) -> Option<OptionGroup> {
        self.data.option_groups.first()
    }

    /// Iterate all models in document order.
    pub fn models(&self) -> impl Iterator<Item = Model> {
        let mut cur = self.model_first();
        std::iter::from_fn(move || {
            let m = cur.take()?;
            cur = m.next();
            Some(m)
        })
    }

    /// Iterate all layouts in document order.
    pub fn layouts(&self) -> impl Iterator<Item = Layout> {
        let mut cur = self.layout_first();
        std::iter::from_fn(move || {
            let l = cur.take()?;
            cur = l.next();
            Some(l)
        })
    }

    /// Iterate all option groups in document order.
    pub fn option_groups(&self) -> impl Iterator<Item = OptionGroup> {
        let mut cur = self.option_group_first();
        std::iter::from_fn(move || {
            let g = cur.take()?;
            cur = g.next();
            Some(g)
        })
    }

    /// Splice fully-built sections into the tree. Called once per parse,
    /// after the whole document walk finished.
    fn attach(&self, sections: Sections) {
        for model in sections.models {
            let slot = self.data.models.append(model.clone());
            model.data.link.bind(&self.data, slot);
        }
        for layout in sections.layouts {
            let slot = self.data.layouts.append(layout.clone());
            layout.data.link.bind(&self.data, slot);
        }
        for group in sections.groups {
            let slot = self.data.option_groups.append(group.clone());
            group.data.link.bind(&self.data, slot);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("includes", &self.data.includes.borrow())
            .field("models", &self.data.models.len())
            .field("layouts", &self.data.layouts.len())
            .field("option_groups", &self.data.option_groups.len())
            .finish()
    }
}

pub(crate) struct ModelData {
    link: Link<ContextData>,
    name: Option<String>,
    vendor: Option<String>,
    description: Option<String>,
}

/// A keyboard model, e.g. `pc104`.
#[derive(Clone)]
pub struct Model {
    data: Rc<ModelData>,
}

impl Model {
    pub(crate) fn new(
        name: Option<String>,
        vendor: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            data: Rc::new(ModelData {
                link: Link::detached(),
                name,
                vendor,
                description,
            }),
        }
    }

    /// Model name, or `None` if absent in the source.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    /// Vendor string, or `None` if absent in the source.
    pub fn vendor(&self) -> Option<&str> {
        self.data.vendor.as_deref()
    }

    /// Human-readable description, or `None` if absent in the source.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// The following model in document order, or `None` at the end of the
    /// list or once the owning context is gone.
    pub fn next(&self) -> Option<Model> {
        let ctx = self.data.link.parent()?;
        ctx.models.get(self.data.link.slot() + 1)
    }
}

pub(crate) struct LayoutData {
    link: Link<ContextData>,
    name: Option<String>,
    brief: Option<String>,
    description: Option<String>,
    variants: Children<Variant>,
}

/// A keyboard layout. The layout itself stands for the bare layout, the
/// equivalent of a null variant; its variants are a sublevel.
#[derive(Clone)]
pub struct Layout {
    data: Rc<LayoutData>,
}

impl Layout {
    pub(crate) fn new(
        name: Option<String>,
        brief: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            data: Rc::new(LayoutData {
                link: Link::detached(),
                name,
                brief,
                description,
                variants: Children::new(),
            }),
        }
    }

    pub(crate) fn push_variant(&self, variant: Variant) {
        let slot = self.data.variants.append(variant.clone());
        variant.data.link.bind(&self.data, slot);
    }

    /// Layout name, or `None` if absent in the source.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    /// Short label, or `None` if absent in the source.
    pub fn brief(&self) -> Option<&str> {
        self.data.brief.as_deref()
    }

    /// Human-readable description, or `None` if absent in the source.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// The first variant of this layout, in document order.
    pub fn variant_first(&self) -> Option<Variant> {
        self.data.variants.first()
    }

    /// Iterate the variants of this layout in document order.
    pub fn variants(&self) -> impl Iterator<Item = Variant> {
        let mut cur = self.variant_first();
        std::iter::from_fn(move || {
            let v = cur.take()?;
            cur = v.next();
            Some(v)
        })
    }

    /// The following layout in document order, or `None` at the end of the
    /// list or once the owning context is gone.
    pub fn next(&self) -> Option<Layout> {
        let ctx = self.data.link.parent()?;
        ctx.layouts.get(self.data.link.slot() + 1)
    }
}

pub(crate) struct VariantData {
    link: Link<LayoutData>,
    name: Option<String>,
    brief: Option<String>,
    description: Option<String>,
}

/// A variant of one layout.
#[derive(Clone)]
pub struct Variant {
    data: Rc<VariantData>,
}

impl Variant {
    pub(crate) fn new(
        name: Option<String>,
        brief: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            data: Rc::new(VariantData {
                link: Link::detached(),
                name,
                brief,
                description,
            }),
        }
    }

    /// Variant name, or `None` if absent in the source.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    /// Short label, or `None` if absent in the source.
    pub fn brief(&self) -> Option<&str> {
        self.data.brief.as_deref()
    }

    /// Human-readable description, or `None` if absent in the source.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// The following variant in document order, or `None` at the end of
    /// the list or once the owning layout is gone.
    pub fn next(&self) -> Option<Variant> {
        let layout = self.data.link.parent()?;
        layout.variants.get(self.data.link.slot() + 1)
    }
}

pub(crate) struct OptionGroupData {
    link: Link<ContextData>,
    name: Option<String>,
    description: Option<String>,
    allows_multiple: bool,
    options: Children<OptionEntry>,
}

/// A group of options sharing one mutual-exclusivity policy.
#[derive(Clone)]
pub struct OptionGroup {
    data: Rc<OptionGroupData>,
}

impl OptionGroup {
    pub(crate) fn new(
        name: Option<String>,
        description: Option<String>,
        allows_multiple: bool,
    ) -> Self {
        Self {
            data: Rc::new(OptionGroupData {
                link: Link::detached(),
                name,
                description,
                allows_multiple,
                options: Children::new(),
            }),
        }
    }

    pub(crate) fn push_option(&self, option: OptionEntry) {
        let slot = self.data.options.append(option.clone());
        option.data.link.bind(&self.data, slot);
    }

    /// Group name, or `None` if absent in the source.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    /// Human-readable description, or `None` if absent in the source.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// Whether several options of this group may be selected at once.
    /// `false` means the options are mutually exclusive.
    pub fn allows_multiple(&self) -> bool {
        self.data.allows_multiple
    }

    /// The first option of this group, in document order.
    pub fn option_first(&self) -> Option<OptionEntry> {
        self.data.options.first()
    }

    /// Iterate the options of this group in document order.
    pub fn options(&self) -> impl Iterator<Item = OptionEntry> {
        let mut cur = self.option_first();
        std::iter::from_fn(move || {
            let o = cur.take()?;
            cur = o.next();
            Some(o)
        })
    }

    /// The following group in document order, or `None` at the end of the
    /// list or once the owning context is gone.
    pub fn next(&self) -> Option<OptionGroup> {
        let ctx = self.data.link.parent()?;
        ctx.option_groups.get(self.data.link.slot() + 1)
    }
}

pub(crate) struct OptionEntryData {
    link: Link<OptionGroupData>,
    name: Option<String>,
    brief: Option<String>,
    description: Option<String>,
}

/// One option within an option group.
#[derive(Clone)]
pub struct OptionEntry {
    data: Rc<OptionEntryData>,
}

impl OptionEntry {
    pub(crate) fn new(
        name: Option<String>,
        brief: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            data: Rc::new(OptionEntryData {
                link: Link::detached(),
                name,
                brief,
                description,
            }),
        }
    }

    /// Option name, or `None` if absent in the source.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    /// Short label, or `None` if absent in the source.
    pub fn brief(&self) -> Option<&str> {
        self.data.brief.as_deref()
    }

    /// Human-readable description, or `None` if absent in the source.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// The following option in document order, or `None` at the end of the
    /// list or once the owning group is gone.
    pub fn next(&self) -> Option<OptionEntry> {
        let group = self.data.link.parent()?;
        group.options.get(self.data.link.slot() + 1)
    }
}

macro_rules! handle_identity {
    ($type_:ident) => {
        impl PartialEq for $type_ {
            /// Handles are equal when they refer to the same entity.
            fn eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.data, &other.data)
            }
        }

        impl Eq for $type_ {}

        impl fmt::Debug for $type_ {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($type_))
                    .field("name", &self.data.name)
                    .finish()
            }
        }
    };
}

handle_identity!(Model);
handle_identity!(Layout);
handle_identity!(Variant);
handle_identity!(OptionGroup);
handle_identity!(OptionEntry);
