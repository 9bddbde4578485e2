use crate::models::SpotImage;

/// URL of the first image flagged as preview, or `""` when there is none
pub fn select_preview<'a, I>(images: I) -> String
where
    I: IntoIterator<Item = &'a SpotImage>,
{
    images
        .into_iter()
        .find(|image| image.preview)
        .map(|image| image.url.clone())
        .unwrap_or_default()
}
