use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::fs;
use std::thread;
use image::ImageReader;
use tiny_skia::{Pixmap, Transform};
use walkdir::WalkDir;

const ICON_EXTENSIONS: [&str; 2] = ["svg", "png"];

/// Card icons, decoded off the event loop.
///
/// `get` never blocks: a miss queues a request for the worker thread, which
/// answers on the calloop channel handed to `new`; the loop then calls
/// `insert` and redraws.
pub struct IconCache {
    cache: HashMap<String, Option<Pixmap>>,
    pending: HashSet<String>,
    request_tx: Sender<(String, u32)>,
}

impl IconCache {
    pub fn new(response_tx: calloop::channel::Sender<(String, Option<Pixmap>)>, extra_dirs: Vec<PathBuf>) -> Self {
        let (request_tx, request_rx) = channel::<(String, u32)>();
        let resolver = IconResolver::new(extra_dirs);

        thread::spawn(move || {
            while let Ok((icon_name, size)) = request_rx.recv() {
                let pixmap = resolver.find(&icon_name).and_then(|path| load_icon(&path, size));
                if pixmap.is_none() {
                    log::debug!("Icon {:?} not found or not decodable", icon_name);
                }
                if response_tx.send((icon_name, pixmap)).is_err() {
                    break;
                }
            }
        });

        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            request_tx,
        }
    }

    pub fn get(&mut self, icon_name: &str, size: u32) -> Option<&Pixmap> {
        if !self.cache.contains_key(icon_name) {
            if self.pending.insert(icon_name.to_string()) {
                let _ = self.request_tx.send((icon_name.to_string(), size));
            }
            return None;
        }
        self.cache.get(icon_name).and_then(Option::as_ref)
    }

    pub fn insert(&mut self, name: String, pixmap: Option<Pixmap>) {
        self.pending.remove(&name);
        self.cache.insert(name, pixmap);
    }
}

/// Maps an icon name to a file: absolute paths are used as-is, names are
/// searched for (`<name>.svg` before `<name>.png`) under the icon roots.
struct IconResolver {
    roots: Vec<PathBuf>,
}

impl IconResolver {
    fn new(extra_dirs: Vec<PathBuf>) -> Self {
        let mut roots = extra_dirs;
        if let Some(home) = directories::BaseDirs::new() {
            roots.push(home.data_dir().join("icons"));
        }
        roots.push(PathBuf::from("/usr/share/icons/hicolor"));
        roots.push(PathBuf::from("/usr/share/pixmaps"));
        Self { roots }
    }

    fn find(&self, icon_name: &str) -> Option<PathBuf> {
        let path = Path::new(icon_name);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }

        for root in self.roots.iter().filter(|r| r.exists()) {
            let mut raster = None;
            for entry in WalkDir::new(root).max_depth(4).into_iter().flatten() {
                if !entry.file_type().is_file() || !is_icon_named(entry.path(), icon_name) {
                    continue;
                }
                if has_extension(entry.path(), "svg") {
                    return Some(entry.into_path());
                }
                if raster.is_none() {
                    raster = Some(entry.into_path());
                }
            }
            if raster.is_some() {
                return raster;
            }
        }
        None
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(ext)
}

fn is_icon_named(path: &Path, icon_name: &str) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some(icon_name)
        && ICON_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn load_icon(path: &Path, size: u32) -> Option<Pixmap> {
    if has_extension(path, "svg") {
        load_svg(path, size)
    } else {
        load_raster(path, size)
    }
}

fn load_raster(path: &Path, size: u32) -> Option<Pixmap> {
    let img = ImageReader::open(path).ok()?.decode().ok()?;
    let img = img.resize(size, size, image::imageops::FilterType::Lanczos3);
    let mut rgba = img.into_rgba8();

    // tiny-skia wants premultiplied alpha
    for pixel in rgba.chunks_exact_mut(4) {
        let a = pixel[3] as f32 / 255.0;
        pixel[0] = (pixel[0] as f32 * a) as u8;
        pixel[1] = (pixel[1] as f32 * a) as u8;
        pixel[2] = (pixel[2] as f32 * a) as u8;
    }

    let (width, height) = (rgba.width(), rgba.height());
    Pixmap::from_vec(rgba.into_vec(), tiny_skia::IntSize::from_wh(width, height)?)
}

fn load_svg(path: &Path, size: u32) -> Option<Pixmap> {
    let opt = resvg::usvg::Options::default();
    let svg_data = fs::read(path).ok()?;
    let tree = resvg::usvg::Tree::from_data(&svg_data, &opt).ok()?;

    let mut pixmap = Pixmap::new(size, size)?;
    let transform = Transform::from_scale(
        size as f32 / tree.size().width(),
        size as f32 / tree.size().height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect width="16" height="16" fill="red"/></svg>"#;

    fn resolver_for(root: &Path) -> IconResolver {
        IconResolver { roots: vec![root.to_path_buf()] }
    }

    #[test]
    fn test_find_prefers_svg_over_png() {
        let dir = tempfile::tempdir().unwrap();
        let apps = dir.path().join("48x48/apps");
        let scalable = dir.path().join("scalable/apps");
        fs::create_dir_all(&apps).unwrap();
        fs::create_dir_all(&scalable).unwrap();
        fs::write(apps.join("server.png"), b"").unwrap();
        fs::write(scalable.join("server.svg"), SQUARE_SVG).unwrap();

        let found = resolver_for(dir.path()).find("server").unwrap();
        assert_eq!(found, scalable.join("server.svg"));
    }

    #[test]
    fn test_find_ignores_other_names_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.txt"), b"").unwrap();
        fs::write(dir.path().join("servers.png"), b"").unwrap();
        assert!(resolver_for(dir.path()).find("server").is_none());

        fs::write(dir.path().join("server.png"), b"").unwrap();
        assert_eq!(resolver_for(dir.path()).find("server"), Some(dir.path().join("server.png")));
    }

    #[test]
    fn test_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("custom.svg");
        let resolver = resolver_for(Path::new("/nonexistent"));
        assert!(resolver.find(icon.to_str().unwrap()).is_none());
        fs::write(&icon, SQUARE_SVG).unwrap();
        assert_eq!(resolver.find(icon.to_str().unwrap()), Some(icon));
    }

    #[test]
    fn test_load_svg_to_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("square.svg");
        fs::write(&icon, SQUARE_SVG).unwrap();
        let pixmap = load_icon(&icon, 24).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (24, 24));
    }
}
