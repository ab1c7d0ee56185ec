use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::classify::{classify, classify_with_fallback, index_with_fallback};
use crate::config::{DatasetLayout, UnreadablePolicy};
use crate::context::RunContext;
use crate::conversion::{AnnotationJob, OutputStrategy};
use crate::error::ConvertError;
use crate::io::{dotted_extension, find_annotation_files, walk_files, ImageResolver, OutputNamer};
use crate::types::ProcessingStats;
use crate::utils::{create_progress_bar, read_and_parse_xml};

/// Main dataset processing pipeline.
///
/// Converts every annotation with the given strategy, then copies the images
/// no annotation referred to into their class folders.
pub fn process_dataset(
    layout: &DatasetLayout,
    strategy: &dyn OutputStrategy,
) -> Result<ProcessingStats, ConvertError> {
    let namer = OutputNamer::new(&layout.output_dir);
    let resolver = ImageResolver::new(&layout.images_dir, &layout.fallback_images_dir);
    let mut ctx = RunContext::new();

    info!("Processing annotation files ({} output)...", strategy.name());
    process_annotation_files(layout, strategy, &resolver, &namer, &mut ctx)?;

    if layout.include_background {
        info!("Processing unlabelled images...");
        process_background_images(&layout.images_dir, &namer, &mut ctx)?;
        info!("Unlabelled image processing complete.");
    }

    ctx.stats.print_summary();
    Ok(ctx.stats)
}

/// First pass: every annotation file under the dataset root
pub fn process_annotation_files(
    layout: &DatasetLayout,
    strategy: &dyn OutputStrategy,
    resolver: &ImageResolver,
    namer: &OutputNamer,
    ctx: &mut RunContext,
) -> Result<(), ConvertError> {
    let annotation_files: Vec<PathBuf> =
        find_annotation_files(&layout.dataset_dir, &layout.annotation_ext)?
            .into_iter()
            .filter(|path| !path.starts_with(namer.root()))
            .collect();
    info!("Found {} annotation files.", annotation_files.len());

    let pb = create_progress_bar(annotation_files.len() as u64, "Annotations");
    for path in &annotation_files {
        ctx.stats.increment_total();
        let result = process_annotation(path, layout, strategy, resolver, namer, ctx);
        pb.inc(1);

        match result {
            Ok(()) => {}
            Err(e) if e.is_unreadable() && layout.unreadable == UnreadablePolicy::Skip => {
                warn!("Skipping annotation: {}", e);
                ctx.stats.increment_skipped_unreadable();
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
    }
    pb.finish_with_message("Annotation processing complete");
    Ok(())
}

fn process_annotation(
    path: &Path,
    layout: &DatasetLayout,
    strategy: &dyn OutputStrategy,
    resolver: &ImageResolver,
    namer: &OutputNamer,
    ctx: &mut RunContext,
) -> Result<(), ConvertError> {
    let record = read_and_parse_xml(path)?;

    let key = path_key(path, &layout.dataset_dir);
    let class = classify_with_fallback(&key, &record.path);
    let class_index = index_with_fallback(&key, &record.path);

    let Some(image_path) = resolver.resolve(&record.path)? else {
        debug!(
            "No image named after {:?} for {}, skipping",
            record.path,
            path.display()
        );
        ctx.stats.increment_skipped_missing_image();
        return Ok(());
    };

    let job = AnnotationJob {
        annotation_path: path,
        image_path: &image_path,
        record,
        class,
        class_index,
    };
    strategy.emit(job, namer, ctx)?;
    ctx.stats.increment_successful();
    Ok(())
}

/// Second pass: copy every image under `images_dir` that the first pass did
/// not already copy. Always named per class, whatever the output format.
pub fn process_background_images(
    images_dir: &Path,
    namer: &OutputNamer,
    ctx: &mut RunContext,
) -> Result<(), ConvertError> {
    // Every file counts, whatever its extension.
    let images: Vec<PathBuf> = walk_files(images_dir)
        .filter(|path| !matches!(path, Ok(p) if p.starts_with(namer.root())))
        .collect::<Result<_, _>>()?;

    let pb = create_progress_bar(images.len() as u64, "Unlabelled");
    for image in &images {
        pb.inc(1);
        if ctx.is_copied(image) {
            continue;
        }

        let class = classify(&path_key(image, images_dir));
        let counter = ctx.class_counter(class);
        let output_path = namer.name_for(class, counter, &dotted_extension(image))?;
        if let Err(e) = ctx.copy_image(image, &output_path) {
            pb.abandon();
            return Err(e);
        }
        ctx.increment_class(class);
        ctx.stats.increment_background();
    }
    pb.finish_with_message("Unlabelled image processing complete");
    Ok(())
}

// Classify on the part below the root so the root's own name never matches.
fn path_key(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
