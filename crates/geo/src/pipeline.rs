//! Block wise execution of a [`Reduction`] over a [`RasterSourceSet`] into an [`OutputWriter`].
//!
//! Every output block is computed from the co-located blocks of all sources, so the peak memory
//! use is bounded by `(sources + 1) * block pixels` per worker and independent of the raster extent.

use inf::progressinfo::ProgressNotification;

use crate::{BlockSpec, NODATA, OutputWriter, PixelBlock, RasterSourceSet, Reduction, Result, Tiling};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumThreads {
    AllCpus,
    Count(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOptions {
    /// Configure how many threads are used to compute the output blocks (default = 1)
    pub num_threads: NumThreads,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            num_threads: NumThreads::Count(1),
        }
    }
}

impl ProcessingOptions {
    pub fn with_threads(num_threads: NumThreads) -> Self {
        Self { num_threads }
    }

    fn thread_count(&self) -> Option<usize> {
        match self.num_threads {
            NumThreads::AllCpus => None,
            NumThreads::Count(val) => Some(val),
        }
    }
}

/// Compute every block of the writer's tiling with the reduction and write it to the output.
///
/// The progress is reset to the number of blocks and ticked after every written block,
/// a cancelled progress stops the processing with [`crate::Error::Cancelled`].
/// The output pixels do not depend on the thread count or on the order in which blocks are finished.
pub fn reduce_tiles(
    sources: &RasterSourceSet,
    writer: &mut OutputWriter,
    reduction: Reduction,
    opts: &ProcessingOptions,
    progress: impl ProgressNotification,
) -> Result {
    reduction.check_source_count(sources.len())?;
    sources.grid().check_aligned_with(writer.grid(), writer.path())?;

    let tiling = writer.tiling()?;
    log::debug!(
        "Applying {reduction} on {} sources: {} blocks of {}x{}",
        sources.len(),
        tiling.block_count(),
        tiling.block_size().0,
        tiling.block_size().1
    );

    let mut tracker = BlockTracker::new(&tiling, progress);
    let thread_count = opts.thread_count();
    if thread_count.is_some_and(|count| count <= 1) || !cfg!(feature = "rayon") || tiling.block_count() <= 1 {
        for block in &tiling {
            let output = reduce_block(sources, &reduction, block)?;
            writer.write_pixel_block(&output)?;
            tracker.block_done()?;
        }
    } else {
        #[cfg(feature = "rayon")]
        reduce_tiles_parallel(sources, writer, reduction, &tiling, thread_count, &mut tracker)?;
    }

    Ok(())
}

fn reduce_block(sources: &RasterSourceSet, reduction: &Reduction, block: BlockSpec) -> Result<PixelBlock> {
    let inputs = sources.read_blocks(&block)?;
    let mut output = PixelBlock::filled_with(block, NODATA);
    reduction.apply(&inputs, &mut output)?;
    Ok(output)
}

#[cfg(feature = "rayon")]
fn create_scoped_thread_pool(thread_count: Option<usize>) -> Result<rayon::ThreadPool> {
    let mut pool_builder = rayon::ThreadPoolBuilder::new();
    if let Some(count) = thread_count {
        pool_builder = pool_builder.num_threads(count);
    }
    pool_builder
        .build()
        .map_err(|e| crate::Error::Runtime(format!("Failed to create threadpool: {e}")))
}

/// Workers claim block indices from a shared counter and send the computed blocks to the calling thread,
/// which is the only one writing to the output.
/// Raster handles are not shared between threads: every worker opens its own source set.
#[cfg(feature = "rayon")]
fn reduce_tiles_parallel<P: ProgressNotification>(
    sources: &RasterSourceSet,
    writer: &mut OutputWriter,
    reduction: Reduction,
    tiling: &Tiling,
    thread_count: Option<usize>,
    tracker: &mut BlockTracker<P>,
) -> Result {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let pool = create_scoped_thread_pool(thread_count)?;
    let worker_count = pool.current_num_threads().clamp(1, tiling.block_count());
    log::debug!("Processing {} blocks with {worker_count} workers", tiling.block_count());

    let paths = sources.paths();
    let grid = sources.grid().clone();
    let next_block = AtomicUsize::new(0);
    let (tx, rx) = std::sync::mpsc::sync_channel::<Result<PixelBlock>>(worker_count * 2);

    pool.in_place_scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let (paths, grid, next_block) = (&paths, &grid, &next_block);
            scope.spawn(move |_| {
                let worker_sources = match RasterSourceSet::open_with_reference(paths, grid) {
                    Ok(set) => set,
                    Err(err) => {
                        let _ = tx.send(Err(err));
                        return;
                    }
                };

                while let Some(block) = tiling.block(next_block.fetch_add(1, Ordering::Relaxed)) {
                    let result = reduce_block(&worker_sources, &reduction, block);
                    let failed = result.is_err();
                    if tx.send(result).is_err() || failed {
                        // the receiver is gone or this worker can not continue
                        return;
                    }
                }
            });
        }
        drop(tx);

        // dropping the receiver on an early return makes the pending sends fail so the workers stop
        let rx = rx;
        let mut received = 0;
        for result in rx.iter() {
            writer.write_pixel_block(&result?)?;
            tracker.block_done()?;
            received += 1;
        }

        if received != tiling.block_count() {
            return Err(crate::Error::Runtime(format!(
                "Only {received} of {} blocks were computed",
                tiling.block_count()
            )));
        }

        Ok(())
    })
}

/// Forwards block completion to the progress and logs a line per finished row of blocks
struct BlockTracker<P: ProgressNotification> {
    progress: P,
    done: usize,
    block_count: usize,
    blocks_per_row: usize,
}

impl<P: ProgressNotification> BlockTracker<P> {
    fn new(tiling: &Tiling, progress: P) -> Self {
        progress.reset(tiling.block_count() as u64);
        Self {
            progress,
            done: 0,
            block_count: tiling.block_count(),
            blocks_per_row: tiling.blocks_per_row().max(1),
        }
    }

    fn block_done(&mut self) -> Result {
        self.done += 1;
        if self.done % self.blocks_per_row == 0 || self.done == self.block_count {
            log::debug!(
                "Processed {}/{} blocks ({:.1}%)",
                self.done,
                self.block_count,
                self.done as f64 * 100.0 / self.block_count as f64
            );
        }

        Ok(self.progress.tick()?)
    }
}
