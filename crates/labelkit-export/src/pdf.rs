//! Minimal PDF writer for raster label pages.
//!
//! Every label image becomes an RGB image XObject painted into its placement
//! rectangle. Page coordinates come in from the top-left like the rest of
//! the layout code and are flipped to PDF's bottom-left origin here.

use image::RgbImage;
use labelkit_core::ExportError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

struct OpenPage {
    width: f64,
    height: f64,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Builds a PDF one page at a time.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    current: Option<OpenPage>,
    image_count: usize,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            current: None,
            image_count: 0,
        }
    }

    /// Number of pages started so far
    pub fn page_count(&self) -> usize {
        self.kids.len() + usize::from(self.current.is_some())
    }

    /// Close the current page, if any, and start a new one in points.
    pub fn begin_page(&mut self, width: f64, height: f64) -> Result<(), ExportError> {
        self.end_page()?;
        self.current = Some(OpenPage {
            width,
            height,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
        Ok(())
    }

    /// Paint `image` into the rectangle at (`x`, `y`) from the page's
    /// top-left corner, `width` by `height` points.
    pub fn place_image(
        &mut self,
        image: &RgbImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ExportError> {
        let page = self
            .current
            .as_mut()
            .ok_or_else(|| ExportError::encoding("no page started before placing an image"))?;

        let image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(image.width())),
            "Height" => Object::Integer(i64::from(image.height())),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
        };
        let image_id = self
            .doc
            .add_object(Stream::new(image_dict, image.as_raw().clone()));

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        page.xobjects.set(name.as_bytes(), Object::Reference(image_id));

        let bottom = page.height - y - height;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width as f32),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height as f32),
                    Object::Real(x as f32),
                    Object::Real(bottom as f32),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), ExportError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };
        let content = Content {
            operations: page.operations,
        }
        .encode()
        .map_err(|e| ExportError::encoding(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width as f32),
                Object::Real(page.height as f32),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => page.xobjects,
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Close the document and serialize it.
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        self.end_page()?;
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal("Labels"),
            "Producer" => Object::string_literal(concat!("labelkit ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ExportError::encoding(e.to_string()))?;
        Ok(buffer)
    }
}
