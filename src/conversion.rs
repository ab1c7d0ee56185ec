use log::{debug, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::classify::Class;
use crate::config::Format;
use crate::context::RunContext;
use crate::error::ConvertError;
use crate::io::{dotted_extension, OutputNamer};
use crate::types::{AnnotationRecord, PixelBox};
use crate::utils::{encode_annotation, relative_path};

/// One annotation whose image has been located, ready to be written out
#[derive(Debug)]
pub struct AnnotationJob<'a> {
    pub annotation_path: &'a Path,
    pub image_path: &'a Path,
    pub record: AnnotationRecord,
    pub class: Class,
    /// YOLO class id, -1 when no keyword matched
    pub class_index: i32,
}

/// How a resolved annotation lands in the output tree.
///
/// Implementations must only advance counters in `ctx` once every file of
/// the job has been written.
pub trait OutputStrategy {
    fn name(&self) -> &'static str;

    fn emit(
        &self,
        job: AnnotationJob<'_>,
        namer: &OutputNamer,
        ctx: &mut RunContext,
    ) -> Result<(), ConvertError>;
}

/// Pick the output strategy once, at startup
pub fn strategy_for(format: Format) -> Box<dyn OutputStrategy> {
    match format {
        Format::Voc => Box::new(VocRewriter),
        Format::Yolo => Box::new(YoloNormalizer),
    }
}

/// Copies the image into its class folder next to a rewritten VOC annotation
#[derive(Debug, Default, Clone, Copy)]
pub struct VocRewriter;

impl OutputStrategy for VocRewriter {
    fn name(&self) -> &'static str {
        "voc"
    }

    fn emit(
        &self,
        job: AnnotationJob<'_>,
        namer: &OutputNamer,
        ctx: &mut RunContext,
    ) -> Result<(), ConvertError> {
        let AnnotationJob {
            annotation_path,
            image_path,
            mut record,
            class,
            ..
        } = job;

        let counter = ctx.class_counter(class);
        let image_out = namer.name_for(class, counter, &dotted_extension(image_path))?;
        let xml_out = namer.name_for(class, counter, &dotted_extension(annotation_path))?;

        let image_name = image_out
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative_dir = relative_path(
            xml_out.parent().unwrap_or(namer.root()),
            image_out.parent().unwrap_or(namer.root()),
        );

        record.path = relative_dir.join(&image_name).to_string_lossy().into_owned();
        record.filename = image_name;
        record.object.name = class.as_str().to_string();

        let xml = encode_annotation(&record, annotation_path)?;
        fs::write(&xml_out, xml).map_err(|e| ConvertError::io(&xml_out, e))?;
        if let Err(e) = ctx.copy_image(image_path, &image_out) {
            let _ = fs::remove_file(&xml_out);
            return Err(e);
        }
        ctx.increment_class(class);

        debug!(
            "{} -> {} ({})",
            annotation_path.display(),
            xml_out.display(),
            class
        );
        Ok(())
    }
}

/// Writes `yolo/<n>.jpg` and a one-line `yolo/<n>.txt` label per annotation
#[derive(Debug, Default, Clone, Copy)]
pub struct YoloNormalizer;

impl OutputStrategy for YoloNormalizer {
    fn name(&self) -> &'static str {
        "yolo"
    }

    fn emit(
        &self,
        job: AnnotationJob<'_>,
        namer: &OutputNamer,
        ctx: &mut RunContext,
    ) -> Result<(), ConvertError> {
        let bbox = job.record.object.bndbox.pixels(job.annotation_path)?;
        let size = job.record.size.dimensions(job.annotation_path)?;

        if job.class_index < 0 {
            warn!(
                "No class keyword in {} or its image path, writing label -1",
                job.annotation_path.display()
            );
        }
        let line = normalize_box(job.class_index, bbox, size);

        let counter = ctx.global_counter();
        let image_out = namer.yolo_name_for(counter, ".jpg")?;
        let label_out = namer.yolo_name_for(counter, ".txt")?;

        let mut writer =
            BufWriter::new(File::create(&label_out).map_err(|e| ConvertError::io(&label_out, e))?);
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| ConvertError::io(&label_out, e))?;
        drop(writer);

        if let Err(e) = ctx.copy_image(job.image_path, &image_out) {
            let _ = fs::remove_file(&label_out);
            return Err(e);
        }
        ctx.increment_global();

        debug!("{} -> {}", job.annotation_path.display(), label_out.display());
        Ok(())
    }
}

/// Convert pixel corners into a YOLO label line.
///
/// The centre is shifted by one pixel (`(min + max) / 2 - 1`) before being
/// normalized; existing label sets were produced with this offset.
pub fn normalize_box(class_index: i32, bbox: PixelBox, (width, height): (i64, i64)) -> String {
    let dw = 1.0 / width as f64;
    let dh = 1.0 / height as f64;
    // Summed in f64 so corners near i64::MAX cannot overflow.
    let x_center = (bbox.xmin as f64 + bbox.xmax as f64) / 2.0 - 1.0;
    let y_center = (bbox.ymin as f64 + bbox.ymax as f64) / 2.0 - 1.0;
    let box_width = bbox.xmax as f64 - bbox.xmin as f64;
    let box_height = bbox.ymax as f64 - bbox.ymin as f64;

    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_index,
        x_center * dw,
        y_center * dh,
        box_width * dw,
        box_height * dh
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, ImageSize, ObjectEntry};

    fn knife_record() -> AnnotationRecord {
        AnnotationRecord {
            folder: "knife".to_string(),
            filename: "k1.jpg".to_string(),
            path: "C:\\data\\knife\\k1.jpg".to_string(),
            size: ImageSize {
                width: "100".to_string(),
                height: "50".to_string(),
                depth: "3".to_string(),
            },
            segmented: "0".to_string(),
            object: ObjectEntry {
                name: "blade".to_string(),
                pose: "Unspecified".to_string(),
                truncated: "0".to_string(),
                difficult: "0".to_string(),
                bndbox: BoundingBox {
                    xmin: "10".to_string(),
                    ymin: "10".to_string(),
                    xmax: "50".to_string(),
                    ymax: "30".to_string(),
                },
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_box() {
        let bbox = PixelBox {
            xmin: 10,
            ymin: 10,
            xmax: 50,
            ymax: 30,
        };
        assert_eq!(
            normalize_box(0, bbox, (100, 50)),
            "0 0.290000 0.380000 0.400000 0.400000"
        );
        assert_eq!(
            normalize_box(-1, bbox, (100, 50)),
            "-1 0.290000 0.380000 0.400000 0.400000"
        );
    }

    #[test]
    fn test_normalize_box_extreme_corners() {
        let bbox = PixelBox {
            xmin: i64::MAX - 1,
            ymin: i64::MIN,
            xmax: i64::MAX,
            ymax: i64::MAX,
        };
        let line = normalize_box(1, bbox, (1, 1));
        assert!(line.starts_with("1 "));
        assert!(!line.contains("NaN") && !line.contains("inf"));
    }

    #[test]
    fn test_voc_rewriter_writes_pair_and_counts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let image = temp_dir.path().join("k1.jpg");
        let annotation = temp_dir.path().join("k1.xml");
        fs::write(&image, b"jpeg").unwrap();

        let namer = OutputNamer::new(temp_dir.path().join("output"));
        let mut ctx = RunContext::new();
        let job = AnnotationJob {
            annotation_path: &annotation,
            image_path: &image,
            record: knife_record(),
            class: Class::Knife,
            class_index: 0,
        };
        VocRewriter.emit(job, &namer, &mut ctx).unwrap();

        let out = temp_dir.path().join("output/knife");
        assert!(out.join("knife_0.jpg").is_file());
        let xml = fs::read_to_string(out.join("knife_0.xml")).unwrap();
        assert!(xml.contains("<path>knife_0.jpg</path>"));
        assert!(xml.contains("<filename>knife_0.jpg</filename>"));
        assert!(xml.contains("<name>knife</name>"));
        assert_eq!(ctx.class_counter(Class::Knife), 1);
        assert!(ctx.is_copied(&image));
    }

    #[test]
    fn test_voc_rewriter_failed_copy_keeps_counter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let annotation = temp_dir.path().join("k1.xml");
        let missing_image = temp_dir.path().join("gone.jpg");

        let namer = OutputNamer::new(temp_dir.path().join("output"));
        let mut ctx = RunContext::new();
        let job = AnnotationJob {
            annotation_path: &annotation,
            image_path: &missing_image,
            record: knife_record(),
            class: Class::Knife,
            class_index: 0,
        };
        assert!(VocRewriter.emit(job, &namer, &mut ctx).is_err());
        assert_eq!(ctx.class_counter(Class::Knife), 0);
        assert!(!temp_dir.path().join("output/knife/knife_0.xml").exists());
    }

    #[test]
    fn test_yolo_normalizer_writes_label() {
        let temp_dir = tempfile::tempdir().unwrap();
        let image = temp_dir.path().join("k1.png");
        let annotation = temp_dir.path().join("k1.xml");
        fs::write(&image, b"png").unwrap();

        let namer = OutputNamer::new(temp_dir.path().join("output"));
        let mut ctx = RunContext::new();
        let job = AnnotationJob {
            annotation_path: &annotation,
            image_path: &image,
            record: knife_record(),
            class: Class::Knife,
            class_index: 0,
        };
        YoloNormalizer.emit(job, &namer, &mut ctx).unwrap();

        let out = temp_dir.path().join("output/yolo");
        assert!(out.join("0.jpg").is_file());
        assert_eq!(
            fs::read_to_string(out.join("0.txt")).unwrap(),
            "0 0.290000 0.380000 0.400000 0.400000"
        );
        assert_eq!(ctx.global_counter(), 1);
        assert_eq!(ctx.class_counter(Class::Knife), 0);
    }

    #[test]
    fn test_yolo_normalizer_rejects_bad_geometry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let image = temp_dir.path().join("k1.jpg");
        fs::write(&image, b"jpeg").unwrap();

        let mut record = knife_record();
        record.object.bndbox.xmax = "50.5".to_string();

        let annotation = temp_dir.path().join("k1.xml");
        let namer = OutputNamer::new(temp_dir.path().join("output"));
        let mut ctx = RunContext::new();
        let job = AnnotationJob {
            annotation_path: &annotation,
            image_path: &image,
            record,
            class: Class::Knife,
            class_index: 0,
        };
        let err = YoloNormalizer.emit(job, &namer, &mut ctx).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNumber { field: "xmax", .. }));
        assert_eq!(ctx.global_counter(), 0);
    }

    #[test]
    fn test_yolo_normalizer_rejects_zero_width() {
        let temp_dir = tempfile::tempdir().unwrap();
        let image = temp_dir.path().join("k1.jpg");
        fs::write(&image, b"jpeg").unwrap();

        let mut record = knife_record();
        record.size.width = "0".to_string();

        let annotation = temp_dir.path().join("k1.xml");
        let namer = OutputNamer::new(temp_dir.path().join("output"));
        let mut ctx = RunContext::new();
        let job = AnnotationJob {
            annotation_path: &annotation,
            image_path: &image,
            record,
            class: Class::Knife,
            class_index: 0,
        };
        let err = YoloNormalizer.emit(job, &namer, &mut ctx).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNumber { field: "width", .. }));
        assert!(!temp_dir.path().join("output/yolo/0.txt").exists());
        assert_eq!(ctx.global_counter(), 0);
    }
}
