//! ImgWrap - Image placeholder component.
//!
//! A `span.img-wrap` that displays one pooled clone of its source's image.
//! The placeholder holds at most one clone handle at a time: assigning a new
//! source releases the previous handle before checking out the next one, and
//! teardown always releases what is held.
//!
//! Loading is gated by a [`ViewportDetector`]: the source's `schedule_load`
//! is called only while the placeholder is mounted and the detector is
//! visible. With lazy loading off, the detector is forced visible up front.
//!
//! # Example
//!
//! ```ignore
//! let wrap = ImgWrap::new(manager.clone(), &runtime, ImgWrapProps {
//!     src: Some("cat.png".into()),
//!     on_load_success: Some(Rc::new(|img| println!("loaded {img:?}"))),
//!     ..Default::default()
//! })?;
//!
//! wrap.set_alt(Some("A cat".into()));
//! wrap.mount(runtime.document.body());
//! runtime.render()?; // after-render visibility check, then scheduleLoad
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::dom::{Document, NodeId};
use crate::error::{PoolError, Result};
use crate::manager::ImgManager;
use crate::runtime::Runtime;
use crate::source::{ChangeHandler, CloneEvent, CloneHandle, LoadState};
use crate::state::ViewportDetector;
use crate::types::{AttributeMap, ImgAttr, LoadStatus, IMG_ATTRIBUTES};

use super::types::{ImgWrapProps, LoadCallback, WrapState};

/// Class always present on the wrapper element.
pub const WRAP_CLASS: &str = "img-wrap";

/// Inline style of the wrapper element.
pub const WRAP_STYLE: &str = "display: inline-block;";

// =============================================================================
// Internal State
// =============================================================================

struct WrapData {
    state: WrapState,
    src: Option<String>,
    source: Option<Rc<dyn LoadState>>,
    handle: Option<CloneHandle>,
    attributes: [Option<String>; IMG_ATTRIBUTES.len()],
    /// Attributes changed while detached with a clone held.
    queued: Vec<ImgAttr>,
    lazy_load: Option<bool>,
    delay: Option<Duration>,
    loading_class: Option<String>,
    error_class: Option<String>,
    success_class: Option<String>,
    on_load_success: Option<LoadCallback>,
    on_load_error: Option<LoadCallback>,
}

struct WrapInner {
    manager: Rc<ImgManager>,
    document: Document,
    element: NodeId,
    detector: ViewportDetector,
    data: RefCell<WrapData>,
    this: Weak<WrapInner>,
}

impl WrapInner {
    fn effective_lazy_load(&self) -> bool {
        let data = self.data.borrow();
        if let Some(lazy_load) = data.lazy_load {
            return lazy_load;
        }
        match &data.source {
            Some(source) => source.lazy_load(),
            None => self.manager.rule_for_src(data.src.as_deref()).lazy_load,
        }
    }

    fn attribute_map(&self) -> AttributeMap {
        let data = self.data.borrow();
        IMG_ATTRIBUTES
            .iter()
            .map(|attr| (attr.name().to_string(), data.attributes[attr.index()].clone()))
            .collect()
    }

    fn change_handler(&self) -> ChangeHandler {
        let weak = self.this.clone();
        Rc::new(move |event, node| {
            if let Some(inner) = weak.upgrade() {
                inner.on_clone_event(event, node);
            }
        })
    }

    // -------------------------------------------------------------------------
    // Source Assignment
    // -------------------------------------------------------------------------

    fn assign_source(&self, src: Option<String>) -> Result<(), PoolError> {
        self.release_handle()?;

        let explicit_delay = {
            let mut data = self.data.borrow_mut();
            data.src = src.clone();
            data.delay
        };

        if let Some(src) = src.filter(|src| !src.is_empty()) {
            let source = self.manager.source_for_src(Some(&src));
            let attributes = self.attribute_map();
            let handle = source.create_clone(&attributes, self.change_handler())?;
            tracing::debug!(%src, clone = ?handle.node(), "assigned source");

            {
                let mut data = self.data.borrow_mut();
                data.source = Some(source);
                data.handle = Some(handle);
                data.queued.clear();
            }

            if explicit_delay.is_none() {
                self.detector.set_delay(self.manager.rule_for_src(Some(&src)).delay);
            }
            if !self.effective_lazy_load() {
                self.detector.force_visible();
            }
        }

        self.insert_img_node();
        self.refresh_class();
        Ok(())
    }

    /// Give the held clone back and forget the source.
    fn release_handle(&self) -> Result<(), PoolError> {
        let (source, handle) = {
            let mut data = self.data.borrow_mut();
            (data.source.take(), data.handle.take())
        };
        let (Some(source), Some(handle)) = (source, handle) else { return Ok(()) };
        match source.release_clone(&handle) {
            // The manager tore the pool down under us
            Err(PoolError::UnknownHandle(id)) => {
                tracing::trace!(handle = id, "clone already discarded");
                Ok(())
            }
            result => result,
        }
    }

    // -------------------------------------------------------------------------
    // Insertion and Scheduling
    // -------------------------------------------------------------------------

    fn insert_img_node(&self) {
        let (node, queued) = {
            let mut data = self.data.borrow_mut();
            let data = &mut *data;
            if data.state != WrapState::InDom {
                return;
            }
            let Some(node) = data.handle.as_ref().map(|handle| handle.node()) else { return };
            let queued: Vec<(ImgAttr, Option<String>)> = std::mem::take(&mut data.queued)
                .into_iter()
                .map(|attr| (attr, data.attributes[attr.index()].clone()))
                .collect();
            (node, queued)
        };

        self.document.append_child(self.element, node);
        for (attr, value) in queued {
            if let Err(error) = self.manager.pool().set_attribute(node, attr.name(), value.as_deref()) {
                tracing::warn!(%attr, %error, "could not apply queued attribute");
            }
        }
        self.schedule_load();
    }

    fn schedule_load(&self) {
        let source = {
            let data = self.data.borrow();
            if data.state != WrapState::InDom || !self.detector.is_visible() {
                return;
            }
            data.source.clone()
        };
        if let Some(source) = source {
            tracing::debug!(key = %source.key(), "scheduling load");
            source.schedule_load();
        }
        self.refresh_class();
    }

    fn on_clone_event(&self, event: CloneEvent, node: NodeId) {
        let CloneEvent::Change = event;
        let source = {
            let data = self.data.borrow();
            if data.state.is_destroyed() {
                return;
            }
            data.source.clone()
        };
        let Some(source) = source else { return };

        self.insert_img_node();
        self.refresh_class();

        let callback = {
            let data = self.data.borrow();
            if source.is_success() {
                data.on_load_success.clone()
            } else {
                data.on_load_error.clone()
            }
        };
        if let Some(callback) = callback {
            callback(node);
        }
    }

    // -------------------------------------------------------------------------
    // Presentation
    // -------------------------------------------------------------------------

    fn status_class(&self) -> Option<String> {
        let data = self.data.borrow();
        let status = data.source.as_ref()?.status();
        let (custom, default) = match status {
            LoadStatus::Loading => (&data.loading_class, self.manager.default_loading_class()),
            LoadStatus::Error => (&data.error_class, self.manager.default_error_class()),
            LoadStatus::Success => (&data.success_class, self.manager.default_success_class()),
            LoadStatus::Pending => return None,
        };
        Some(custom.clone().unwrap_or_else(|| default.to_string()))
    }

    fn refresh_class(&self) {
        if self.data.borrow().state == WrapState::Destroyed {
            return;
        }
        let class = match self.status_class() {
            Some(status) => format!("{WRAP_CLASS} {status}"),
            None => WRAP_CLASS.to_string(),
        };
        self.document.set_attribute(self.element, "class", &class);
    }

    fn set_attr(&self, attr: ImgAttr, value: Option<String>) {
        let target = {
            let mut data = self.data.borrow_mut();
            let data = &mut *data;
            if data.state.is_destroyed() {
                return;
            }
            data.attributes[attr.index()] = value.clone();
            match (&data.handle, data.state) {
                (Some(handle), WrapState::InDom) => Some(handle.node()),
                (Some(_), _) => {
                    if !data.queued.contains(&attr) {
                        data.queued.push(attr);
                    }
                    None
                }
                (None, _) => None,
            }
        };

        if let Some(node) = target {
            if let Err(error) = self.manager.pool().set_attribute(node, attr.name(), value.as_deref()) {
                tracing::warn!(%attr, %error, "could not forward attribute");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    fn mount(&self, parent: NodeId) {
        {
            let mut data = self.data.borrow_mut();
            if data.state.is_destroyed() {
                return;
            }
            data.state = WrapState::InDom;
        }
        self.document.append_child(parent, self.element);
        self.detector.attach(self.element);
        self.insert_img_node();
        self.refresh_class();
    }

    fn unmount(&self) {
        {
            let mut data = self.data.borrow_mut();
            if data.state != WrapState::InDom {
                return;
            }
            data.state = WrapState::PreRender;
        }
        self.detector.detach();
        self.document.remove(self.element);
    }

    fn destroy(&self) {
        {
            let mut data = self.data.borrow_mut();
            if data.state.is_destroyed() {
                return;
            }
            data.state = WrapState::Destroying;
        }

        self.detector.destroy();
        if let Err(error) = self.release_handle() {
            tracing::warn!(%error, "could not release clone on teardown");
        }
        self.document.destroy_node(self.element);

        let mut data = self.data.borrow_mut();
        data.state = WrapState::Destroyed;
        data.on_load_success = None;
        data.on_load_error = None;
    }
}

// =============================================================================
// ImgWrap
// =============================================================================

/// An image placeholder. Dropping it tears it down.
pub struct ImgWrap {
    inner: Rc<WrapInner>,
}

impl ImgWrap {
    /// Create a detached placeholder and assign its initial source.
    pub fn new(manager: Rc<ImgManager>, runtime: &Runtime, props: ImgWrapProps) -> Result<Self> {
        let document = runtime.document.clone();
        let element = document.create_element("span");
        document.set_attribute(element, "class", WRAP_CLASS);
        document.set_attribute(element, "style", WRAP_STYLE);

        let mut attributes: [Option<String>; IMG_ATTRIBUTES.len()] = Default::default();
        for (attr, value) in props.attributes {
            attributes[attr.index()] = Some(value);
        }
        let delay = props
            .delay
            .unwrap_or_else(|| manager.rule_for_src(props.src.as_deref()).delay);

        let inner = Rc::new_cyclic(|this: &Weak<WrapInner>| {
            let weak = this.clone();
            let detector = ViewportDetector::new(runtime, delay, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule_load();
                }
            });

            WrapInner {
                manager,
                document,
                element,
                detector,
                data: RefCell::new(WrapData {
                    state: WrapState::PreRender,
                    src: None,
                    source: None,
                    handle: None,
                    attributes,
                    queued: Vec::new(),
                    lazy_load: props.lazy_load,
                    delay: props.delay,
                    loading_class: props.loading_class,
                    error_class: props.error_class,
                    success_class: props.success_class,
                    on_load_success: props.on_load_success,
                    on_load_error: props.on_load_error,
                }),
                this: this.clone(),
            }
        });

        let wrap = Self { inner };
        wrap.inner.assign_source(props.src)?;
        if !wrap.inner.effective_lazy_load() {
            wrap.inner.detector.force_visible();
        }
        Ok(wrap)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Insert the placeholder under `parent` and start watching the viewport.
    pub fn mount(&self, parent: NodeId) {
        self.inner.mount(parent);
    }

    /// Remove the placeholder from the document. The clone stays held.
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// Release the clone and destroy the element. Idempotent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    pub fn state(&self) -> WrapState {
        self.inner.data.borrow().state
    }

    // -------------------------------------------------------------------------
    // Source
    // -------------------------------------------------------------------------

    pub fn src(&self) -> Option<String> {
        self.inner.data.borrow().src.clone()
    }

    /// Assign a new source. Assigning the current source is a no-op.
    pub fn set_src(&self, src: Option<String>) -> Result<()> {
        {
            let data = self.inner.data.borrow();
            if data.state.is_destroyed() || data.src == src {
                return Ok(());
            }
        }
        self.inner.assign_source(src)?;
        Ok(())
    }

    /// The load state currently bound, if any.
    pub fn source(&self) -> Option<Rc<dyn LoadState>> {
        self.inner.data.borrow().source.clone()
    }

    /// Override the lazy-load policy. Turning it off starts loading if mounted.
    pub fn set_lazy_load(&self, lazy_load: bool) {
        self.inner.data.borrow_mut().lazy_load = Some(lazy_load);
        if !lazy_load && self.inner.detector.force_visible() {
            self.inner.schedule_load();
        }
    }

    pub fn lazy_load(&self) -> bool {
        self.inner.effective_lazy_load()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.data.borrow_mut().delay = Some(delay);
        self.inner.detector.set_delay(delay);
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Set or clear a presentational attribute.
    pub fn set_attr(&self, attr: ImgAttr, value: Option<String>) {
        self.inner.set_attr(attr, value);
    }

    pub fn attr(&self, attr: ImgAttr) -> Option<String> {
        self.inner.data.borrow().attributes[attr.index()].clone()
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    pub fn status(&self) -> LoadStatus {
        self.source().map_or(LoadStatus::Pending, |source| source.status())
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    pub fn is_error(&self) -> bool {
        self.status().is_error()
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    pub fn progress(&self) -> u8 {
        self.source().map_or(0, |source| source.progress())
    }

    pub fn entered_viewport(&self) -> bool {
        self.inner.detector.is_visible()
    }

    /// Class for the current status, `None` before any load.
    pub fn status_class(&self) -> Option<String> {
        self.inner.status_class()
    }

    /// The clone currently held.
    pub fn img_node(&self) -> Option<NodeId> {
        self.inner.data.borrow().handle.as_ref().map(|handle| handle.node())
    }

    /// The wrapper element.
    pub fn element(&self) -> NodeId {
        self.inner.element
    }
}

impl Drop for ImgWrap {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}

macro_rules! img_attr_accessors {
    ($($attr:ident => $get:ident, $set:ident;)*) => {
        impl ImgWrap {
            $(
                #[doc = concat!("The `", stringify!($get), "` attribute.")]
                pub fn $get(&self) -> Option<String> {
                    self.attr(ImgAttr::$attr)
                }

                #[doc = concat!("Set or clear the `", stringify!($get), "` attribute.")]
                pub fn $set(&self, value: Option<String>) {
                    self.set_attr(ImgAttr::$attr, value);
                }
            )*
        }
    };
}

img_attr_accessors! {
    Id => id, set_id;
    Title => title, set_title;
    Align => align, set_align;
    Alt => alt, set_alt;
    Border => border, set_border;
    Height => height, set_height;
    Hspace => hspace, set_hspace;
    Ismap => ismap, set_ismap;
    Longdesc => longdesc, set_longdesc;
    Name => name, set_name;
    Width => width, set_width;
    Usemap => usemap, set_usemap;
    Vspace => vspace, set_vspace;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::source::{FetchRequest, FetchResponder, Fetcher};
    use std::cell::Cell;
    use taffy::geometry::Size;

    #[derive(Default)]
    struct ManualFetcher {
        responders: RefCell<Vec<FetchResponder>>,
    }

    impl Fetcher for ManualFetcher {
        fn fetch(&self, request: FetchRequest) {
            self.responders.borrow_mut().push(request.responder);
        }
    }

    impl ManualFetcher {
        fn count(&self) -> usize {
            self.responders.borrow().len()
        }

        fn last(&self) -> FetchResponder {
            self.responders.borrow().last().cloned().unwrap()
        }
    }

    fn setup(config: Config) -> (Runtime, Rc<ImgManager>, Rc<ManualFetcher>) {
        let runtime = Runtime::new(Size { width: 800.0, height: 600.0 });
        let fetcher = Rc::new(ManualFetcher::default());
        let manager = ImgManager::with_fetcher(config, runtime.document.clone(), fetcher.clone()).unwrap();
        (runtime, Rc::new(manager), fetcher)
    }

    fn eager(src: &str) -> ImgWrapProps {
        ImgWrapProps {
            lazy_load: Some(false),
            ..ImgWrapProps::new(src)
        }
    }

    #[test]
    fn test_element_shape() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, ImgWrapProps::default()).unwrap();
        let doc = &runtime.document;

        assert_eq!(doc.tag(wrap.element()).as_deref(), Some("span"));
        assert_eq!(doc.get_attribute(wrap.element(), "class").as_deref(), Some("img-wrap"));
        assert_eq!(doc.get_attribute(wrap.element(), "style").as_deref(), Some(WRAP_STYLE));
        assert_eq!(wrap.state(), WrapState::PreRender);
        assert_eq!(wrap.img_node(), None);
        assert_eq!(wrap.status_class(), None);
    }

    #[test]
    fn test_clone_inserted_on_mount() {
        let (runtime, manager, fetcher) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, eager("a.png").attr(ImgAttr::Alt, "x")).unwrap();
        let doc = &runtime.document;

        let img = wrap.img_node().unwrap();
        assert_ne!(doc.parent(img), Some(wrap.element()));
        assert_eq!(fetcher.count(), 0);

        wrap.mount(doc.body());

        assert_eq!(doc.children(wrap.element()), vec![img]);
        assert_eq!(doc.get_attribute(img, "alt").as_deref(), Some("x"));
        assert_eq!(fetcher.count(), 1);
        assert!(wrap.is_loading());
        assert_eq!(doc.get_attribute(wrap.element(), "class").as_deref(), Some("img-wrap loading"));
    }

    #[test]
    fn test_attribute_forwarded_when_mounted() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, eager("a.png")).unwrap();
        let doc = &runtime.document;
        wrap.mount(doc.body());

        wrap.set_title(Some("t".into()));
        let img = wrap.img_node().unwrap();
        assert_eq!(doc.get_attribute(img, "title").as_deref(), Some("t"));
        assert_eq!(wrap.title().as_deref(), Some("t"));

        wrap.set_title(None);
        assert!(!doc.has_attribute(img, "title"));
    }

    #[test]
    fn test_attribute_queued_while_detached() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, eager("a.png")).unwrap();
        let doc = &runtime.document;
        let img = wrap.img_node().unwrap();

        wrap.set_width(Some("120".into()));
        assert!(!doc.has_attribute(img, "width"));

        wrap.mount(doc.body());
        assert_eq!(doc.get_attribute(img, "width").as_deref(), Some("120"));
    }

    #[test]
    fn test_attributes_carried_to_next_source() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, eager("a.png")).unwrap();
        wrap.set_alt(Some("cat".into()));

        wrap.set_src(Some("b.png".into())).unwrap();
        let img = wrap.img_node().unwrap();
        assert_eq!(runtime.document.get_attribute(img, "alt").as_deref(), Some("cat"));
        assert_eq!(runtime.document.get_attribute(img, "src").as_deref(), Some("b.png"));
    }

    #[test]
    fn test_load_notifications() {
        let (runtime, manager, fetcher) = setup(Config::default());
        let successes = Rc::new(Cell::new(0));
        let errors = Rc::new(RefCell::new(Vec::new()));

        let s = successes.clone();
        let e = errors.clone();
        let a = ImgWrap::new(manager.clone(), &runtime, ImgWrapProps {
            on_load_success: Some(Rc::new(move |_| s.set(s.get() + 1))),
            ..eager("a.png")
        })
        .unwrap();
        let b = ImgWrap::new(manager, &runtime, ImgWrapProps {
            on_load_error: Some(Rc::new(move |node| e.borrow_mut().push(node))),
            success_class: Some("done".into()),
            ..eager("b.png")
        })
        .unwrap();

        a.mount(runtime.document.body());
        fetcher.last().succeed();
        b.mount(runtime.document.body());
        fetcher.last().fail();

        assert_eq!(successes.get(), 1);
        assert_eq!(*errors.borrow(), vec![b.img_node().unwrap()]);
        assert_eq!(a.status_class().as_deref(), Some("success"));
        assert_eq!(b.status_class().as_deref(), Some("error"));
        assert_eq!(a.progress(), 100);
    }

    #[test]
    fn test_destroy_releases_clone() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager.clone(), &runtime, eager("a.png")).unwrap();
        let element = wrap.element();
        wrap.mount(runtime.document.body());

        drop(wrap);

        assert!(!runtime.document.exists(element));
        assert_eq!(manager.pool().checked_out_count(Some("a.png")), 0);
        assert_eq!(manager.pool().free_count(Some("a.png")), 1);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager.clone(), &runtime, eager("a.png")).unwrap();

        wrap.destroy();
        wrap.destroy();
        wrap.set_alt(Some("ignored".into()));
        wrap.set_src(Some("b.png".into())).unwrap();

        assert_eq!(wrap.state(), WrapState::Destroyed);
        assert_eq!(manager.stats().total_used_clones, 0);
        assert_eq!(wrap.img_node(), None);
    }

    #[test]
    fn test_empty_source_holds_nothing() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager.clone(), &runtime, eager("a.png")).unwrap();

        wrap.set_src(Some(String::new())).unwrap();
        assert_eq!(wrap.img_node(), None);
        assert!(wrap.source().is_none());
        assert_eq!(manager.pool().checked_out_count(Some("a.png")), 0);
    }

    #[test]
    fn test_unmount_hides_until_remount() {
        let (runtime, manager, fetcher) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, ImgWrapProps::new("a.png")).unwrap();
        let doc = &runtime.document;

        wrap.mount(doc.body());
        wrap.unmount();
        runtime.render().unwrap();

        assert!(!doc.is_connected(wrap.element()));
        assert!(!wrap.entered_viewport());
        assert_eq!(fetcher.count(), 0);

        wrap.mount(doc.body());
        runtime.render().unwrap();
        assert!(wrap.entered_viewport());
        assert_eq!(fetcher.count(), 1);
    }

    #[test]
    fn test_turning_lazy_load_off_starts_loading() {
        let (runtime, manager, fetcher) = setup(Config::default());
        let wrap = ImgWrap::new(manager, &runtime, ImgWrapProps::new("a.png")).unwrap();
        let doc = &runtime.document;

        // Push the placeholder below the fold
        let spacer = doc.create_element("div");
        doc.set_box_size(spacer, Size { width: 10.0, height: 2000.0 });
        doc.append_child(doc.body(), spacer);
        wrap.mount(doc.body());
        runtime.render().unwrap();
        assert_eq!(fetcher.count(), 0);

        wrap.set_lazy_load(false);
        assert!(wrap.entered_viewport());
        assert_eq!(fetcher.count(), 1);
    }

    #[test]
    fn test_set_src_after_manager_teardown() {
        let (runtime, manager, _) = setup(Config::default());
        let wrap = ImgWrap::new(manager.clone(), &runtime, ImgWrapProps::new("a.png")).unwrap();
        let doc = &runtime.document;
        wrap.mount(doc.body());
        let old = wrap.img_node().unwrap();

        manager.teardown();
        assert!(doc.children(wrap.element()).is_empty());

        wrap.set_src(Some("b.png".into())).unwrap();
        let img = wrap.img_node().unwrap();
        assert_ne!(img, old);
        assert_eq!(doc.children(wrap.element()), vec![img]);
        assert_eq!(doc.get_attribute(img, "src").as_deref(), Some("b.png"));
        assert_eq!(manager.pool().checked_out_count(Some("b.png")), 1);

        drop(wrap);
        assert_eq!(manager.pool().checked_out_count(Some("b.png")), 0);
    }
}
