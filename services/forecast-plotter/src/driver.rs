//! Chunked parallel rendering of a run.
//!
//! The run's frames are split into contiguous chunks. Each chunk is a task on
//! a bounded rayon pool; the task owns its frames and one `FrameRenderer`
//! and draws the frames strictly in time order. Chunks share nothing except
//! the read-only resolved layout and grid. A failing or panicking chunk is
//! reported and never stops its siblings.

use std::any::Any;
use std::fs;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use frame_common::{balanced_chunk_size, Chunk, PlotError, PlotResult, TimeSeries};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use renderer::{frame_file_name, FrameRenderer, Layout, ResolvedLayout, SchemeRegistry, SurfaceSpec};
use tracing::{debug, error, info, info_span};

/// How a chunk ended.
#[derive(Debug)]
pub enum ChunkStatus {
    Completed,
    /// Rendering or export failed; the frames after `lead_hours` were skipped.
    /// `lead_hours` is `None` when the renderer could not be set up.
    Failed {
        lead_hours: Option<i64>,
        error: PlotError,
    },
    /// The task panicked
    Crashed { message: String },
}

/// Outcome of one chunk.
#[derive(Debug)]
pub struct ChunkReport {
    pub index: usize,
    /// Position of the chunk within the run
    pub range: Range<usize>,
    /// Frames written, in time order
    pub files: Vec<PathBuf>,
    pub status: ChunkStatus,
}

impl ChunkReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ChunkStatus::Completed)
    }
}

/// Renders runs chunk by chunk on at most `pool_size` threads.
pub struct ChunkedParallelDriver {
    pool: ThreadPool,
    pool_size: usize,
    chunk_size: Option<usize>,
    surface: SurfaceSpec,
    output_dir: PathBuf,
}

impl ChunkedParallelDriver {
    /// `chunk_size` of `None` spreads frames evenly over the pool.
    pub fn new(
        pool_size: usize,
        chunk_size: Option<usize>,
        surface: SurfaceSpec,
        output_dir: impl Into<PathBuf>,
    ) -> PlotResult<Self> {
        if pool_size == 0 {
            return Err(PlotError::config("pool size must be at least 1"));
        }
        if chunk_size == Some(0) {
            return Err(PlotError::config("chunk size must be at least 1"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("plot-worker-{}", i))
            .build()
            .map_err(|e| PlotError::config(format!("cannot start worker pool: {}", e)))?;

        Ok(Self {
            pool,
            pool_size,
            chunk_size,
            surface,
            output_dir: output_dir.into(),
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Frames per chunk for a run of `len` frames.
    pub fn chunk_size_for(&self, len: usize) -> usize {
        self.chunk_size
            .unwrap_or_else(|| balanced_chunk_size(len, self.pool_size))
    }

    /// Render every frame of `series` with `layout`.
    ///
    /// Configuration problems (levels, schemes, colors, surface size) and an
    /// unusable output directory fail the whole call before any chunk starts.
    /// Everything after that is reported per chunk, in chunk order.
    pub fn run(
        &self,
        series: TimeSeries,
        layout: &Layout,
        registry: &SchemeRegistry,
    ) -> PlotResult<Vec<ChunkReport>> {
        let resolved = Arc::new(layout.resolve(registry, |field| series.field_range(field))?);

        // Surface errors are per run, not per chunk.
        FrameRenderer::new(Arc::clone(&resolved), Arc::new(series.grid.clone()), self.surface)?;

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            PlotError::export(self.output_dir.display().to_string(), e.to_string())
        })?;

        let chunk_size = self.chunk_size_for(series.len());
        let chunks = series.into_chunks(chunk_size)?;
        info!(
            variable = %resolved.variable_name,
            chunks = chunks.len(),
            chunk_size,
            pool_size = self.pool_size,
            "dispatching run"
        );

        let surface = self.surface;
        let output_dir = self.output_dir.as_path();
        Ok(self.dispatch(chunks, |chunk, files| {
            render_chunk(chunk, Arc::clone(&resolved), surface, output_dir, files)
        }))
    }

    /// Run `work` once per chunk on the pool, isolating panics. Reports come
    /// back in chunk order.
    ///
    /// `work` records each file it writes in the vector it is handed, so a
    /// crashed chunk still reports the frames finished before the panic.
    pub fn dispatch<F>(&self, chunks: Vec<Chunk>, work: F) -> Vec<ChunkReport>
    where
        F: Fn(&Chunk, &mut Vec<PathBuf>) -> ChunkStatus + Sync,
    {
        self.pool.install(|| {
            chunks
                .into_par_iter()
                .map(|chunk| {
                    let mut files = Vec::with_capacity(chunk.frames.len());
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&chunk, &mut files)));
                    let status = match outcome {
                        Ok(status) => status,
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            error!(
                                chunk_start = chunk.range.start,
                                chunk_end = chunk.range.end,
                                written = files.len(),
                                panic = %message,
                                "chunk worker crashed"
                            );
                            ChunkStatus::Crashed { message }
                        }
                    };
                    ChunkReport {
                        index: chunk.index,
                        range: chunk.range.clone(),
                        files,
                        status,
                    }
                })
                .collect()
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Draw and export a chunk's frames in order, stopping at the first error.
fn render_chunk(
    chunk: &Chunk,
    layout: Arc<ResolvedLayout>,
    surface: SurfaceSpec,
    output_dir: &Path,
    files: &mut Vec<PathBuf>,
) -> ChunkStatus {
    let variable = layout.variable_name.clone();
    let span = info_span!(
        "chunk",
        variable = %variable,
        chunk_start = chunk.range.start,
        chunk_end = chunk.range.end
    );
    let _guard = span.enter();
    let started = Instant::now();

    let mut renderer = match FrameRenderer::new(layout, Arc::clone(&chunk.grid), surface) {
        Ok(renderer) => renderer,
        Err(error) => {
            error!(error = %error, kind = error.kind(), "cannot set up renderer");
            return ChunkStatus::Failed { lead_hours: None, error };
        }
    };

    for frame in &chunk.frames {
        let time = chunk.forecast_time(frame);
        let lead_hours = time.lead_hours();
        let path = output_dir.join(frame_file_name(&variable, lead_hours));
        let frame_started = Instant::now();

        let result = renderer
            .render_frame(frame, time)
            .and_then(|_| renderer.export(&path));
        if let Err(error) = result {
            error!(
                lead_hours,
                error = %error,
                kind = error.kind(),
                written = files.len(),
                "frame failed, abandoning chunk"
            );
            return ChunkStatus::Failed {
                lead_hours: Some(lead_hours),
                error,
            };
        }

        debug!(
            lead_hours,
            path = %path.display(),
            elapsed_ms = frame_started.elapsed().as_millis() as u64,
            "frame written"
        );
        files.push(path);
    }

    renderer.clear_frame();
    info!(
        frames = files.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "chunk complete"
    );
    ChunkStatus::Completed
}
