use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::{anyhow, Context};
use id_arena::{Arena, Id};
use log::{error, info, warn};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{naga, PollType, RenderPipeline};

/// Composable modules imported by the other shaders, relative to the shader folder.
const SHARED_MODULES_FOLDER: &str = "shared";

pub type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

impl PipelineCacheEntry {
    pub fn set_pipeline(&mut self, pipeline: wgpu::RenderPipeline) {
        self.0 = Some(pipeline);
    }
}

/// Collects the pipelines of every pass before the loader compiles them.
///
/// Several pipelines may share one shader file; all of them are rebuilt when it changes.
#[derive(Default)]
pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    pub fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    /// `None` until the pipeline compiled successfully at least once.
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }

    fn get_entry_mut(&mut self, id: PipelineId) -> Option<&mut PipelineCacheEntry> {
        self.pipelines.get_mut(id)
    }

    fn iter_shaders_and_pipelines_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ShaderEntry, &mut PipelineCacheEntry)> {
        // Both arenas are filled by `add_shader`, so their ids line up.
        self.shaders
            .iter()
            .map(|(_, shader_entry)| shader_entry)
            .zip(
                self.pipelines
                    .iter_mut()
                    .map(|(_, pipeline_entry)| pipeline_entry),
            )
    }
}

// Recompiles changed shaders on the watcher thread and hands the pipelines back.
pub(crate) struct ShaderLoader {
    pub cache: PipelineCache,
    device: wgpu::Device,
    shader_folder: PathBuf,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    composer: Arc<RwLock<Composer>>,
    _debouncer: Option<Debouncer<notify_debouncer_mini::notify::RecommendedWatcher>>,
}

impl ShaderLoader {
    pub fn new(
        device: wgpu::Device,
        shader_folder: &Path,
        cache_builder: PipelineCacheBuilder,
    ) -> anyhow::Result<Self> {
        let cache = cache_builder.build();
        let shader_folder = shader_folder.to_path_buf();

        let composer = create_composer(&shader_folder).context("Failed to create shader composer")?;
        let composer = Arc::new(RwLock::new(composer));

        let (send_new_pipelines, recv_new_pipelines) = channel();

        let device_loader = device.clone();
        let shaders = cache.shaders.clone();
        let composer_clone = composer.clone();
        let folder_clone = shader_folder.clone();

        let debouncer = new_debouncer_opt(
            notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
            move |res: DebounceEventResult| match res {
                Ok(events) => {
                    for event in events {
                        if event.kind != DebouncedEventKind::Any {
                            continue;
                        }

                        for (_, entry) in shaders
                            .iter()
                            .filter(|(_, entry)| event.path.ends_with(entry.def.path))
                        {
                            match compile_file(
                                &device_loader,
                                &folder_clone,
                                &entry.def,
                                &entry.factory,
                                &composer_clone,
                            ) {
                                Ok(pipeline) => {
                                    if send_new_pipelines
                                        .send((entry.def.name, entry.pipeline_id, pipeline))
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                                Err(e) => error!("Failed to reload shader: {:?}", e),
                            }
                        }
                    }
                }
                Err(e) => warn!("Error debouncing shader changes: {}", e),
            },
        );

        // Hot reload is a convenience; a missing watcher only costs that.
        let debouncer = match debouncer {
            Ok(mut debouncer) => match shader_folder
                .canonicalize()
                .map_err(notify_debouncer_mini::notify::Error::io)
                .and_then(|folder| debouncer.watcher().watch(&folder, RecursiveMode::Recursive))
            {
                Ok(()) => Some(debouncer),
                Err(e) => {
                    warn!("Shader hot reload disabled: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Shader hot reload disabled: {}", e);
                None
            }
        };

        let mut shader_loader = Self {
            device,
            cache,
            shader_folder,
            receiver: recv_new_pipelines,
            composer,
            _debouncer: debouncer,
        };

        shader_loader.create_all_pipelines()?;

        Ok(shader_loader)
    }

    pub(crate) fn create_all_pipelines(&mut self) -> anyhow::Result<()> {
        let device = self.device.clone();
        let folder = self.shader_folder.clone();
        let composer = self.composer.clone();

        for (shader, pipeline_entry) in self.cache.iter_shaders_and_pipelines_mut() {
            let pipeline = compile_file(&device, &folder, &shader.def, &shader.factory, &composer)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            pipeline_entry.set_pipeline(pipeline);
        }
        Ok(())
    }

    pub(crate) fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.get_entry_mut(pipeline_id) {
                info!("Shader reloaded: {}", name);
                entry.set_pipeline(pipeline);
            }
        }
    }
}

fn compile_file(
    device: &wgpu::Device,
    shader_folder: &Path,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
    composer: &RwLock<Composer>,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path = shader_folder.join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    let file_path = path.to_string_lossy().to_string();

    let module = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow!("Shader composer lock poisoned"))?;
        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &file_path,
                source: &shader_code,
                ..Default::default()
            })
            .context("Failed to create Naga module from shader code")?
    };

    // wgpu validates again when the module is created.
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate Naga module")?;

    let shader_code = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to convert Naga module to WGSL string")?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        return Err(anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    };

    pipeline
}

fn create_composer(shader_folder: &Path) -> anyhow::Result<Composer> {
    let shared_folder = shader_folder.join(SHARED_MODULES_FOLDER);
    let shared_files = std::fs::read_dir(&shared_folder).with_context(|| {
        format!(
            "Failed to read shared shader modules directory {}",
            shared_folder.display()
        )
    })?;
    let mut composer = Composer::default();

    for entry in shared_files {
        let path = entry
            .context("Failed to read entry in shared shader modules directory")?
            .path();

        if !path.is_file() || path.extension().is_none_or(|ext| ext != "wgsl") {
            continue;
        }

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read shared shader module {}", path.display()))?;

        let file_path = path.to_string_lossy().to_string();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: &source,
                file_path: &file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;
    }

    Ok(composer)
}
