//! The SDK context
//!
//! [`Sdk`] owns everything resolution needs: configuration, gamedata, the
//! module source, the binding registry and the netvar cache. Consumers hold
//! a `&Sdk`; nothing in the library reaches for a hidden global.
//!
//! # Lifecycle
//!
//! An attached build creates one `Sdk` at attach time and keeps it for the
//! rest of the process, optionally in the process-wide slot behind
//! [`install`]. Cached bindings live exactly as long as the `Sdk` and are
//! never evicted; a host that patches itself at runtime can leave a cached
//! address stale, which cannot be detected here.
//!
//! # Thread Safety
//!
//! `Sdk` is `Send + Sync`. Lookups may run concurrently from any thread;
//! racing first resolutions converge on one cached value.

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use srcsdk_engine::{export_key, interface_key, BindingRegistry, InterfaceFactory};
use srcsdk_sdk::{versions, Address, ClientClass, IBaseClientDLL, CREATE_INTERFACE_EXPORT};

use crate::config::SdkConfig;
use crate::error::{ResolveError, SdkError};
use crate::field::FieldView;
use crate::gamedata::{Gamedata, OffsetTable};
use crate::memory::{vtable, LoadedModules, ModuleSource};
use crate::netvars::{self, ClassIter, ClassRef, NetvarCache, TableRef};
use crate::scanner::{scan_module_ordered, Scanner};

/// Resolution context for one host process
pub struct Sdk {
    config: SdkConfig,
    gamedata: Arc<Gamedata>,
    offsets: Arc<dyn OffsetTable>,
    scanner: Scanner<Box<dyn ModuleSource>>,
    factories: HashMap<String, InterfaceFactory>,
    registry: BindingRegistry,
    class_head: OnceLock<Address>,
    netvars: NetvarCache,
}

impl Sdk {
    /// Start building a context
    pub fn builder() -> SdkBuilder {
        SdkBuilder::default()
    }

    /// Build a context for the current process from `config`
    ///
    /// Loads the gamedata file the config names and enumerates modules of
    /// this process. Nothing is scanned yet.
    #[tracing::instrument(skip_all)]
    pub fn attach(config: SdkConfig) -> Result<Sdk, SdkError> {
        let path = config.gamedata_path()?;
        let gamedata = Gamedata::load_from_file(&path)?;
        info!("gamedata loaded from {:?}", path);

        Ok(Sdk::builder()
            .config(config)
            .gamedata(gamedata)
            .modules(LoadedModules::new())
            .build())
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn gamedata(&self) -> &Gamedata {
        &self.gamedata
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn scanner(&self) -> &Scanner<Box<dyn ModuleSource>> {
        &self.scanner
    }

    /// Address named by a gamedata signature
    ///
    /// Scans once; later calls return the cached binding. A miss is not
    /// cached.
    pub fn signature(&self, name: &str) -> Result<Address, ResolveError> {
        self.registry
            .try_get_or_resolve(name, || self.scan_signature(name))
    }

    fn scan_signature(&self, name: &str) -> Result<Address, ResolveError> {
        let signature = self
            .gamedata
            .signature(name)
            .ok_or_else(|| ResolveError::SignatureMissing(name.to_string()))?;

        let module = self.config.module_file(&signature.library);
        let info = self
            .scanner
            .modules()
            .module(module)
            .ok_or_else(|| ResolveError::ModuleNotLoaded(module.to_string()))?;

        let hit = scan_module_ordered(&info, &signature.pattern, signature.order).ok_or_else(|| {
            warn!("signature {} not found in {}", name, module);
            ResolveError::SignatureNotFound {
                name: name.to_string(),
                module: module.to_string(),
            }
        })?;

        let address = unsafe { signature.resolve(name, hit)? };
        info!("{} = {} (match at {})", name, address, hit);
        Ok(address)
    }

    /// Exported symbol of a library
    pub fn export(&self, library: &str, symbol: &str) -> Result<Address, ResolveError> {
        let module = self.config.module_file(library);
        let key = export_key(module, symbol);

        self.registry.try_export_or_resolve(&key, || {
            if self.scanner.modules().module(module).is_none() {
                return Err(ResolveError::ModuleNotLoaded(module.to_string()));
            }
            self.scanner
                .resolve_export(module, symbol)
                .ok_or_else(|| ResolveError::ExportNotFound {
                    module: module.to_string(),
                    symbol: symbol.to_string(),
                })
        })
    }

    /// Interface pointer from a library's factory
    ///
    /// `version` is nul-terminated, e.g. `b"VClient018\0"`. Uses an injected
    /// factory for `library` when one was given to the builder, otherwise the
    /// library's `CreateInterface` export.
    pub fn interface<T>(&self, library: &str, version: &[u8]) -> Result<NonNull<T>, ResolveError> {
        let module = self.config.module_file(library);
        let name = version.strip_suffix(b"\0").unwrap_or(version);
        let key = interface_key(module, &String::from_utf8_lossy(name));

        let address = self.registry.try_interface_or_resolve(&key, || {
            let factory = self.factory(library)?;
            // Factories come from the builder, whose injection point is
            // unsafe, or from the module's own export table.
            let ptr = unsafe { factory.get::<T>(version)? };
            debug!("interface {} = {:p}", key, ptr);
            Ok::<_, ResolveError>(Address::from_ptr(ptr.as_ptr()))
        })?;

        NonNull::new(address.as_mut_ptr()).ok_or(ResolveError::NullPointer(key))
    }

    fn factory(&self, library: &str) -> Result<InterfaceFactory, ResolveError> {
        if let Some(factory) = self.factories.get(library) {
            return Ok(factory.clone());
        }

        let module = self.config.module_file(library);
        let export = self.export(library, CREATE_INTERFACE_EXPORT)?;
        unsafe { InterfaceFactory::from_export(export, module) }
            .ok_or_else(|| ResolveError::NullPointer(format!("{}!CreateInterface", module)))
    }

    /// Structure offset from the offset table
    pub fn offset(&self, structure: &str, field: &str) -> Result<i64, ResolveError> {
        self.offsets
            .offset(structure, field)
            .ok_or_else(|| ResolveError::OffsetNotFound {
                structure: structure.to_string(),
                field: field.to_string(),
            })
    }

    /// Virtual table slot of an interface method, from the offset table
    pub fn vfunc_index(&self, interface: &str, method: &str) -> Result<usize, ResolveError> {
        let index = self.offset(interface, method)?;
        usize::try_from(index).map_err(|_| ResolveError::OffsetNotFound {
            structure: interface.to_string(),
            field: method.to_string(),
        })
    }

    /// The host's list of networked classes
    ///
    /// The head comes from `IBaseClientDLL::GetAllClasses`, whose slot index
    /// is the `IBaseClientDLL.GetAllClasses` offset, unless the builder was
    /// given the head directly.
    pub fn class_list(&self) -> Result<ClassIter<'_>, ResolveError> {
        let head = match self.class_head.get() {
            Some(head) => *head,
            None => {
                let head = self.query_class_list()?;
                *self.class_head.get_or_init(|| {
                    debug!("class list head = {}", head);
                    head
                })
            }
        };
        Ok(unsafe { ClassIter::new(head) })
    }

    fn query_class_list(&self) -> Result<Address, ResolveError> {
        let client = self.interface::<IBaseClientDLL>("client", versions::CLIENT_DLL)?;
        let index = self.vfunc_index("IBaseClientDLL", "GetAllClasses")?;

        unsafe {
            let this = Address::from_ptr(client.as_ptr());
            let slot = vtable::vfunc(this, index)
                .non_null()
                .ok_or(ResolveError::ClassListUnavailable)?;
            let get_all_classes: unsafe extern "C" fn(*mut IBaseClientDLL) -> *mut ClientClass =
                std::mem::transmute(slot.value());

            Address::from_ptr(get_all_classes(client.as_ptr()))
                .non_null()
                .ok_or(ResolveError::ClassListUnavailable)
        }
    }

    /// Class by network name
    pub fn class_by_name(&self, name: &str) -> Result<ClassRef<'_>, ResolveError> {
        netvars::find_class_by_name(self.class_list()?, name)
            .ok_or_else(|| ResolveError::TableNotFound(name.to_string()))
    }

    /// Class by numeric id
    pub fn class_by_id(&self, class_id: i32) -> Result<ClassRef<'_>, ResolveError> {
        netvars::find_class_by_id(self.class_list()?, class_id)
            .ok_or_else(|| ResolveError::TableNotFound(format!("class id {}", class_id)))
    }

    /// Property table by network name
    pub fn table(&self, name: &str) -> Result<TableRef<'_>, ResolveError> {
        netvars::find_table(self.class_list()?, name)
            .ok_or_else(|| ResolveError::TableNotFound(name.to_string()))
    }

    /// Offset of a networked field, by table name and dotted path
    pub fn netvar(&self, table: &str, path: &str) -> Result<i64, ResolveError> {
        self.netvars.try_get_or_resolve(table, path, || {
            let root = self.table(table)?;
            Self::walk(root, table, path)
        })
    }

    /// Offset of a networked field, by class network name
    pub fn netvar_in_class(&self, class: &str, path: &str) -> Result<i64, ResolveError> {
        let root = self
            .class_by_name(class)?
            .table()
            .ok_or_else(|| ResolveError::TableNotFound(class.to_string()))?;
        Self::walk(root, class, path)
    }

    /// Offset of a networked field, by numeric class id
    pub fn netvar_by_class_id(&self, class_id: i32, path: &str) -> Result<i64, ResolveError> {
        let class = self.class_by_id(class_id)?;
        let root = class
            .table()
            .ok_or_else(|| ResolveError::TableNotFound(class.name().to_string()))?;
        Self::walk(root, class.name(), path)
    }

    fn walk(root: TableRef<'_>, owner: &str, path: &str) -> Result<i64, ResolveError> {
        netvars::find_path(root, path)
            .map(|found| found.offset)
            .ok_or_else(|| ResolveError::FieldNotFound {
                table: owner.to_string(),
                path: path.to_string(),
            })
    }

    /// Typed view of a networked field on the object at `base`
    pub fn field<T: Copy>(
        &self,
        base: Address,
        table: &str,
        path: &str,
    ) -> Result<FieldView<T>, ResolveError> {
        if base.is_null() {
            return Err(ResolveError::NullPointer(format!("{}.{}", table, path)));
        }
        Ok(FieldView::new(base, self.netvar(table, path)?))
    }

    /// Typed view of an offset-table field on the object at `base`
    pub fn offset_field<T: Copy>(
        &self,
        base: Address,
        structure: &str,
        field: &str,
    ) -> Result<FieldView<T>, ResolveError> {
        if base.is_null() {
            return Err(ResolveError::NullPointer(format!("{}.{}", structure, field)));
        }
        Ok(FieldView::new(base, self.offset(structure, field)?))
    }

    /// Resolve a batch of netvars up front
    ///
    /// Returns the failures; successes are cached.
    pub fn prefetch(&self, netvars: &[(&str, &str)]) -> Vec<ResolveError> {
        let failures: Vec<ResolveError> = netvars
            .iter()
            .filter_map(|(table, path)| self.netvar(table, path).err())
            .collect();

        info!(
            "prefetched {} netvars, {} missing",
            netvars.len() - failures.len(),
            failures.len()
        );
        for failure in &failures {
            warn!("{}", failure);
        }
        failures
    }

    /// Resolve a batch of signatures up front
    ///
    /// Returns the failures; successes are cached.
    pub fn prefetch_signatures(&self, names: &[&str]) -> Vec<ResolveError> {
        names
            .iter()
            .filter_map(|name| self.signature(name).err())
            .inspect(|failure| warn!("{}", failure))
            .collect()
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("config", &self.config)
            .field("bindings", &self.registry.len())
            .field("interfaces", &self.registry.interface_count())
            .field("netvars", &self.netvars.len())
            .finish()
    }
}

/// Builder for [`Sdk`]
#[derive(Default)]
pub struct SdkBuilder {
    config: Option<SdkConfig>,
    gamedata: Option<Gamedata>,
    offsets: Option<Arc<dyn OffsetTable>>,
    modules: Option<Box<dyn ModuleSource>>,
    factories: HashMap<String, InterfaceFactory>,
    bindings: Vec<(String, Address)>,
    class_head: Option<Address>,
}

impl SdkBuilder {
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Signatures, and offsets unless [`SdkBuilder::offsets`] is also given
    pub fn gamedata(mut self, gamedata: Gamedata) -> Self {
        self.gamedata = Some(gamedata);
        self
    }

    /// Offset table to use instead of the gamedata offsets
    pub fn offsets(mut self, offsets: impl OffsetTable + 'static) -> Self {
        self.offsets = Some(Arc::new(offsets));
        self
    }

    /// Module source; defaults to the modules of the current process
    pub fn modules(mut self, modules: impl ModuleSource + 'static) -> Self {
        self.modules = Some(Box::new(modules));
        self
    }

    /// Interface factory for a logical library
    ///
    /// # Safety
    /// The factory must stay callable for the life of the built `Sdk`.
    pub unsafe fn factory(mut self, library: impl Into<String>, factory: InterfaceFactory) -> Self {
        self.factories.insert(library.into(), factory);
        self
    }

    /// Pre-resolved binding, as if a signature scan had produced it
    pub fn binding(mut self, name: impl Into<String>, address: Address) -> Self {
        self.bindings.push((name.into(), address));
        self
    }

    /// Known head of the class list
    ///
    /// Passing the head skips the `GetAllClasses` call. The list must stay
    /// alive and unmodified for the life of the built `Sdk`.
    pub fn class_list(mut self, head: Address) -> Self {
        self.class_head = head.non_null();
        self
    }

    pub fn build(self) -> Sdk {
        let gamedata = Arc::new(self.gamedata.unwrap_or_default());
        let offsets = self
            .offsets
            .unwrap_or_else(|| gamedata.clone() as Arc<dyn OffsetTable>);
        let modules = self
            .modules
            .unwrap_or_else(|| Box::new(LoadedModules::new()));

        let registry = BindingRegistry::new();
        for (name, address) in self.bindings {
            registry.bind(&name, address);
        }

        let class_head = OnceLock::new();
        if let Some(head) = self.class_head {
            let _ = class_head.set(head);
        }

        Sdk {
            config: self.config.unwrap_or_default(),
            gamedata,
            offsets,
            scanner: Scanner::new(modules),
            factories: self.factories,
            registry,
            class_head,
            netvars: NetvarCache::new(),
        }
    }
}

static SDK: OnceLock<Sdk> = OnceLock::new();

/// Install the process-wide context
///
/// Can only succeed once per process.
pub fn install(sdk: Sdk) -> Result<&'static Sdk, SdkError> {
    SDK.set(sdk).map_err(|_| SdkError::AlreadyInstalled)?;
    info!("sdk installed");
    try_sdk().ok_or(SdkError::AlreadyInstalled)
}

/// The process-wide context, if installed
pub fn try_sdk() -> Option<&'static Sdk> {
    SDK.get()
}

/// The process-wide context
///
/// Errors with [`SdkError::NotInstalled`] before [`install`] has run.
pub fn sdk() -> Result<&'static Sdk, SdkError> {
    try_sdk().ok_or(SdkError::NotInstalled)
}
