use crate::animator::{AnimatorProvider, TimedAnimatorProvider, ViewAnimator};
use crate::prefab::ViewPrefab;
use crate::view::{View, ViewBehaviour, ViewState};

use keystone_assets::LoadedAsset;
use keystone_core::{
    short_type_name, AssetService, EngineError, EngineResult, RegistryKind, Service, ServiceCtx,
};
use log::{debug, error, info};
use std::any::TypeId;
use std::collections::HashMap;

#[derive(Clone, Copy)]
struct ViewType {
    type_id: TypeId,
    name: &'static str,
    build: fn() -> Box<dyn ViewBehaviour>,
}

fn build_behaviour<T: ViewBehaviour + Default>() -> Box<dyn ViewBehaviour> {
    Box::new(T::default())
}

/// Owns every view, keyed by behaviour type.
///
/// Views are instantiated from the prefabs tagged with `label`, requested once
/// in `late_init`. Prefab `component` strings are resolved through the
/// registered view types.
pub struct ViewService {
    label: String,
    types: HashMap<&'static str, ViewType>,
    animators: Box<dyn AnimatorProvider>,

    views: Vec<View>,
    by_type: HashMap<TypeId, usize>,
    by_name: HashMap<&'static str, usize>,

    next_order: u64,
    requested: bool,
    settled: bool,
    loaded: bool,
}

impl Default for ViewService {
    #[inline]
    fn default() -> Self {
        Self::new("views")
    }
}

impl ViewService {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            types: HashMap::new(),
            animators: Box::new(TimedAnimatorProvider),
            views: Vec::new(),
            by_type: HashMap::new(),
            by_name: HashMap::new(),
            next_order: 0,
            requested: false,
            settled: false,
            loaded: false,
        }
    }

    /// Makes `T` instantiable from prefabs whose component is `T`'s type name.
    pub fn register_view_type<T: ViewBehaviour + Default>(&mut self) -> EngineResult<()> {
        let name = short_type_name::<T>();
        if self.types.contains_key(name) {
            let e = EngineError::already_exists(RegistryKind::View, name);
            error!(target: "views", "{e}");
            return Err(e);
        }
        self.types.insert(
            name,
            ViewType {
                type_id: TypeId::of::<T>(),
                name,
                build: build_behaviour::<T>,
            },
        );
        Ok(())
    }

    pub fn with_view_type<T: ViewBehaviour + Default>(mut self) -> Self {
        let _ = self.register_view_type::<T>();
        self
    }

    pub fn with_animators(mut self, provider: impl AnimatorProvider + 'static) -> Self {
        self.animators = Box::new(provider);
        self
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True once the view batch was instantiated.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True once the view batch finished, successfully or not, or could not be requested.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Inserts an already-built view, initializing it.
    pub fn add_view<T: ViewBehaviour>(
        &mut self,
        name: impl Into<String>,
        behaviour: T,
        animator: ViewAnimator,
    ) -> EngineResult<()> {
        let view = View::new(name, short_type_name::<T>(), animator, Box::new(behaviour));
        self.insert(TypeId::of::<T>(), view)
    }

    fn insert(&mut self, type_id: TypeId, mut view: View) -> EngineResult<()> {
        let type_name = view.type_name();
        if self.by_type.contains_key(&type_id) || self.by_name.contains_key(type_name) {
            let e = EngineError::already_exists(RegistryKind::View, type_name);
            error!(target: "views", "{e}");
            return Err(e);
        }

        view.init();
        let idx = self.views.len();
        self.by_type.insert(type_id, idx);
        self.by_name.insert(type_name, idx);
        debug!(target: "views", "registered {} ({type_name})", view.name());
        self.views.push(view);
        Ok(())
    }

    /// Builds a view for every prefab in `assets`. Items that fail to parse,
    /// have no known component or duplicate a view type are logged and dropped.
    /// Returns the number of views added.
    pub fn instantiate_batch(&mut self, assets: &[LoadedAsset]) -> usize {
        let mut added = 0;
        for asset in assets {
            let prefab = match ViewPrefab::from_asset(asset) {
                Ok(p) => p,
                Err(e) => {
                    error!(target: "views", "{e}");
                    continue;
                }
            };
            let ty = match self.view_type_of(&prefab) {
                Ok(ty) => ty,
                Err(e) => {
                    error!(target: "views", "{e}, cannot be a View asset");
                    continue;
                }
            };
            let name = prefab.instance_name().to_owned();

            let mut behaviour = (ty.build)();
            behaviour.configure(&prefab);
            let animator =
                ViewAnimator::new(self.animators.create(&prefab), prefab.animator.clone());
            let view = View::new(name, ty.name, animator, behaviour);

            if self.insert(ty.type_id, view).is_ok() {
                added += 1;
            }
        }

        self.loaded = true;
        self.settled = true;
        info!(target: "views", "instantiated {added} views from label '{}'", self.label);
        added
    }

    /// Resolves the prefab's `component` against the registered view types.
    fn view_type_of(&self, prefab: &ViewPrefab) -> EngineResult<ViewType> {
        let registered = prefab
            .component
            .as_deref()
            .and_then(|c| self.types.get(c).copied());
        registered.ok_or_else(|| {
            if let Some(component) = prefab.component.as_deref() {
                debug!(target: "views", "view component '{component}' is not registered");
            }
            EngineError::missing_component(prefab.instance_name(), "View")
        })
    }

    /// Starts opening the view of type `T`.
    ///
    /// Returns `Ok(false)` when it is already open or opening.
    pub fn open<T: ViewBehaviour>(&mut self) -> EngineResult<bool> {
        let idx = self.index_of::<T>()?;
        Ok(self.open_at(idx))
    }

    pub fn close<T: ViewBehaviour>(&mut self) -> EngineResult<bool> {
        let idx = self.index_of::<T>()?;
        Ok(self.views[idx].close())
    }

    /// Same as `open`, keyed by type name.
    pub fn open_named(&mut self, name: &str) -> EngineResult<bool> {
        let idx = self.index_named(name)?;
        Ok(self.open_at(idx))
    }

    pub fn close_named(&mut self, name: &str) -> EngineResult<bool> {
        let idx = self.index_named(name)?;
        Ok(self.views[idx].close())
    }

    fn open_at(&mut self, idx: usize) -> bool {
        let order = self.next_order + 1;
        let started = self.views[idx].open(order);
        if started {
            self.next_order = order;
        }
        started
    }

    fn index_of<T: ViewBehaviour>(&self) -> EngineResult<usize> {
        match self.by_type.get(&TypeId::of::<T>()) {
            Some(&idx) => Ok(idx),
            None => Err(self.missing(short_type_name::<T>())),
        }
    }

    fn index_named(&self, name: &str) -> EngineResult<usize> {
        match self.by_name.get(name) {
            Some(&idx) => Ok(idx),
            None => Err(self.missing(name)),
        }
    }

    fn missing(&self, name: &str) -> EngineError {
        let e = EngineError::not_found(RegistryKind::View, name);
        error!(target: "views", "{e}");
        e
    }

    pub fn view<T: ViewBehaviour>(&self) -> Option<&View> {
        let &idx = self.by_type.get(&TypeId::of::<T>())?;
        self.views.get(idx)
    }

    pub fn view_named(&self, name: &str) -> Option<&View> {
        let &idx = self.by_name.get(name)?;
        self.views.get(idx)
    }

    pub fn state_of<T: ViewBehaviour>(&self) -> Option<ViewState> {
        self.view::<T>().map(View::state)
    }

    pub fn behaviour<T: ViewBehaviour>(&self) -> Option<&T> {
        self.view::<T>()?.downcast_ref::<T>()
    }

    pub fn behaviour_mut<T: ViewBehaviour>(&mut self) -> Option<&mut T> {
        let &idx = self.by_type.get(&TypeId::of::<T>())?;
        self.views.get_mut(idx)?.downcast_mut::<T>()
    }

    /// Type names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.views.iter().map(View::type_name).collect()
    }

    #[inline]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Active views, back to front.
    pub fn draw_order(&self) -> Vec<&View> {
        let mut active: Vec<&View> = self.views.iter().filter(|v| v.is_active()).collect();
        active.sort_by_key(|v| v.order());
        active
    }

    /// Polls every view once. Returns the number of transitions completed.
    pub fn poll_all(&mut self, dt: f32) -> usize {
        let mut done = 0;
        for v in &mut self.views {
            if v.poll(dt) {
                done += 1;
            }
        }
        done
    }
}

impl Service for ViewService {
    fn late_init(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if self.requested {
            return Ok(());
        }
        self.requested = true;

        let Some(assets) = ctx.get::<AssetService>() else {
            self.settled = true;
            return Ok(());
        };

        let label = self.label.clone();
        let request = assets.borrow_mut().load_assets(&self.label, move |services, result| {
            let Some(views) = services.get::<ViewService>() else {
                return;
            };
            let mut views = views.borrow_mut();
            match result {
                Ok(batch) => {
                    views.instantiate_batch(&batch);
                }
                Err(e) => {
                    error!(target: "views", "view batch '{label}' failed: {e}");
                    views.settled = true;
                }
            }
        });

        if request.is_none() {
            self.settled = true;
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        let dt = ctx.frame().map_or(0.0, |f| f.dt);
        self.poll_all(dt);
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        for v in &mut self.views {
            v.cleanup();
        }
        Ok(())
    }
}
