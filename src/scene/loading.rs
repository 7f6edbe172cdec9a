//! Text scene descriptions.
//!
//! ```text
//! 3
//! camera
//! pos: 0 0 0
//! fov: 60
//! f: 400
//! a: 1.5
//! light
//! pos: 10 10 0
//! col: 1 1 1
//! sphere
//! pos: 0 0 -20
//! rad: 5
//! amb: 0.1 0 0
//! dif: 0.6 0 0
//! spe: 0.3 0.3 0.3
//! shi: 20
//! ```
//!
//! The first line is the number of entities that follow. Each entity is a kind line
//! followed by `name: values` field lines in any order. Models have a quoted OBJ file name
//! on the line right after `model`, resolved relative to the models directory.

use std::{
    collections::HashMap,
    fmt, fs,
    iter::Peekable,
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

use super::{Light, Material, Mesh, ObjOpenError, Object, Plane, Scene, Sphere, Triangle};
use crate::{
    camera::Camera,
    geometry::{Color, FloatType, WorldPoint, WorldVector},
};

/// Position in a scene file, for error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    /// 1-based
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}", self.file, self.line)
    }
}

#[derive(Error, Debug)]
pub enum SceneLoadError {
    #[error("Cannot read scene file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad entity count '{value}' ({location})")]
    BadEntityCount { value: String, location: Location },

    #[error("Unknown entity '{kind}' ({location})")]
    UnknownEntity { kind: String, location: Location },

    #[error("Field '{field}' unknown ({location})")]
    UnknownField { field: String, location: Location },

    #[error("Field '{field}' already defined ({location})")]
    DuplicateField { field: String, location: Location },

    #[error("Field '{field}' missing ({location})")]
    MissingField { field: String, location: Location },

    #[error("Field '{field}' deformed ({location})")]
    DeformedField { field: String, location: Location },

    #[error("Model file name missing ({location})")]
    MissingModelFile { location: Location },

    #[error("Unexpected end of file, {missing} more entities expected ({file})")]
    UnexpectedEof { missing: usize, file: String },

    #[error("Camera missing ({file})")]
    MissingCamera { file: String },

    #[error("Camera duplicate ({location})")]
    DuplicateCamera { location: Location },

    #[error("Cannot load model {path} ({location})")]
    Model {
        path: PathBuf,
        location: Location,
        #[source]
        source: ObjOpenError,
    },
}

/// Reads a scene file. Model file names are resolved relative to `models_dir`.
pub fn load_scene(
    path: impl AsRef<Path>,
    models_dir: impl AsRef<Path>,
) -> Result<Scene, SceneLoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_scene(&source, &file_name, models_dir)
}

/// Parses scene description text. `file_name` is only used in error messages.
pub fn parse_scene(
    source: &str,
    file_name: &str,
    models_dir: impl AsRef<Path>,
) -> Result<Scene, SceneLoadError> {
    let mut lines = SceneLines::new(source, file_name);
    let models_dir = models_dir.as_ref();

    let entity_count = match lines.next_line() {
        Some((line, text)) => text.parse::<usize>().map_err(|_| SceneLoadError::BadEntityCount {
            value: text.to_string(),
            location: lines.location(line),
        })?,
        None => {
            return Err(SceneLoadError::BadEntityCount {
                value: String::new(),
                location: lines.location(1),
            });
        }
    };

    let mut camera = None;
    let mut lights = Vec::new();
    let mut objects = Vec::new();

    for loaded in 0..entity_count {
        let Some((line, kind)) = lines.next_line() else {
            return Err(SceneLoadError::UnexpectedEof {
                missing: entity_count - loaded,
                file: file_name.to_string(),
            });
        };
        let location = lines.location(line);

        let entity = match kind {
            "camera" => {
                let fields = lines.fields(&location, &["pos", "fov", "f", "a"])?;
                Entity::Camera(parse_camera(&fields)?)
            }
            "light" => {
                let fields = lines.fields(&location, &["pos", "col"])?;
                Entity::Light(Light::new(fields.point("pos")?, fields.color("col")?))
            }
            "sphere" => {
                let fields = lines.fields(&location, &with_material(&["pos", "rad"]))?;
                let radius = fields.positive("rad")?;
                Entity::Object(Object::new(
                    Sphere::new(fields.point("pos")?, radius),
                    parse_material(&fields)?.shared(),
                ))
            }
            "plane" => {
                let fields = lines.fields(&location, &with_material(&["nor", "pos"]))?;
                let normal = fields.vector("nor")?;
                if normal.norm() == 0.0 {
                    return Err(fields.deformed("nor"));
                }
                Entity::Object(Object::new(
                    Plane::new(normal, fields.point("pos")?),
                    parse_material(&fields)?.shared(),
                ))
            }
            "triangle" => {
                let fields = lines.fields(&location, &with_material(&["v1", "v2", "v3"]))?;
                Entity::Object(Object::new(
                    Triangle::new(fields.point("v1")?, fields.point("v2")?, fields.point("v3")?),
                    parse_material(&fields)?.shared(),
                ))
            }
            "model" => {
                let model_file = lines.model_file(&location)?;
                let fields = lines.fields(&location, &with_material(&[]))?;
                let material = parse_material(&fields)?.shared();

                let path = models_dir.join(model_file);
                let mesh = Mesh::with_obj(&path).map_err(|source| SceneLoadError::Model {
                    path: path.clone(),
                    location: location.clone(),
                    source,
                })?;
                Entity::Object(Object::new(mesh, material))
            }
            other => {
                return Err(SceneLoadError::UnknownEntity {
                    kind: other.to_string(),
                    location,
                });
            }
        };
        log::debug!("Loaded {kind} ({location})");

        match entity {
            Entity::Camera(c) => {
                if camera.is_some() {
                    return Err(SceneLoadError::DuplicateCamera { location });
                }
                camera = Some(c);
            }
            Entity::Light(light) => lights.push(light),
            Entity::Object(object) => objects.push(object),
        }
    }

    if let Some((line, _)) = lines.next_line() {
        log::warn!(
            "Ignoring content after the last entity ({})",
            lines.location(line)
        );
    }

    let camera = camera.ok_or_else(|| SceneLoadError::MissingCamera {
        file: file_name.to_string(),
    })?;

    log::info!(
        "Loaded scene {file_name}: {} objects, {} lights",
        objects.len(),
        lights.len()
    );

    Ok(Scene {
        camera,
        lights,
        objects,
    })
}

enum Entity {
    Camera(Camera),
    Light(Light),
    Object(Object),
}

const MATERIAL_FIELDS: [&str; 4] = ["amb", "dif", "spe", "shi"];

fn with_material(fields: &[&'static str]) -> Vec<&'static str> {
    fields.iter().chain(MATERIAL_FIELDS.iter()).copied().collect()
}

fn parse_material(fields: &Fields) -> Result<Material, SceneLoadError> {
    let shininess = fields.scalar("shi")?;
    if shininess < 0.0 {
        return Err(fields.deformed("shi"));
    }
    Ok(Material::new(
        fields.color("amb")?,
        fields.color("dif")?,
        fields.color("spe")?,
        shininess,
    ))
}

fn parse_camera(fields: &Fields) -> Result<Camera, SceneLoadError> {
    let fov_degrees = fields.scalar("fov")?;
    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        return Err(fields.deformed("fov"));
    }

    Ok(Camera::builder()
        .position(fields.point("pos")?)
        .fov_y(fov_degrees.to_radians())
        .focal_length(fields.positive("f")?)
        .aspect_ratio(fields.positive("a")?)
        .build())
}

/// Non-empty, trimmed lines with their 1-based line numbers.
struct SceneLines<'a> {
    file_name: &'a str,
    lines: Peekable<Box<dyn Iterator<Item = (usize, &'a str)> + 'a>>,
}

impl<'a> SceneLines<'a> {
    fn new(source: &'a str, file_name: &'a str) -> Self {
        let lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a> = Box::new(
            source
                .lines()
                .enumerate()
                .map(|(index, text)| (index + 1, text.trim()))
                .filter(|(_, text)| !text.is_empty()),
        );
        SceneLines {
            file_name,
            lines: lines.peekable(),
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        self.lines.next()
    }

    fn location(&self, line: usize) -> Location {
        Location {
            file: self.file_name.to_string(),
            line,
        }
    }

    /// Quoted file name line following a `model` entity line.
    fn model_file(&mut self, entity: &Location) -> Result<&'a str, SceneLoadError> {
        let missing = || SceneLoadError::MissingModelFile {
            location: entity.clone(),
        };
        let &(_, text) = self.lines.peek().ok_or_else(missing)?;
        let name = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|name| !name.is_empty())
            .ok_or_else(missing)?;
        self.lines.next();
        Ok(name)
    }

    /// Consumes the field lines of one entity.
    /// Fields end at the first line without a colon.
    fn fields(
        &mut self,
        entity: &Location,
        allowed: &[&str],
    ) -> Result<Fields<'a>, SceneLoadError> {
        let mut values = HashMap::new();

        while let Some((name, value)) = self
            .lines
            .peek()
            .and_then(|&(_, text)| text.split_once(':'))
        {
            let (line, _) = self.lines.next().unwrap_or_default();
            let name = name.trim();
            let location = self.location(line);

            if !allowed.contains(&name) {
                return Err(SceneLoadError::UnknownField {
                    field: name.to_string(),
                    location,
                });
            }
            if values.contains_key(name) {
                return Err(SceneLoadError::DuplicateField {
                    field: name.to_string(),
                    location,
                });
            }
            values.insert(name, (location, value.trim()));
        }

        Ok(Fields {
            entity: entity.clone(),
            values,
        })
    }
}

/// Field values of a single entity, by field name.
struct Fields<'a> {
    entity: Location,
    values: HashMap<&'a str, (Location, &'a str)>,
}

impl Fields<'_> {
    fn numbers<const N: usize>(&self, field: &str) -> Result<[FloatType; N], SceneLoadError> {
        let (_, text) = self
            .values
            .get(field)
            .ok_or_else(|| SceneLoadError::MissingField {
                field: field.to_string(),
                location: self.entity.clone(),
            })?;

        let parsed = text
            .split_whitespace()
            .map(FloatType::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| self.deformed(field))?;
        <[FloatType; N]>::try_from(parsed)
            .ok()
            .filter(|numbers| numbers.iter().all(|x| x.is_finite()))
            .ok_or_else(|| self.deformed(field))
    }

    fn deformed(&self, field: &str) -> SceneLoadError {
        let location = self
            .values
            .get(field)
            .map_or_else(|| self.entity.clone(), |(location, _)| location.clone());
        SceneLoadError::DeformedField {
            field: field.to_string(),
            location,
        }
    }

    fn scalar(&self, field: &str) -> Result<FloatType, SceneLoadError> {
        let [x] = self.numbers(field)?;
        Ok(x)
    }

    fn positive(&self, field: &str) -> Result<FloatType, SceneLoadError> {
        let x = self.scalar(field)?;
        if x > 0.0 {
            Ok(x)
        } else {
            Err(self.deformed(field))
        }
    }

    fn vector(&self, field: &str) -> Result<WorldVector, SceneLoadError> {
        Ok(WorldVector::from(self.numbers::<3>(field)?))
    }

    fn point(&self, field: &str) -> Result<WorldPoint, SceneLoadError> {
        Ok(WorldPoint::from(self.vector(field)?))
    }

    fn color(&self, field: &str) -> Result<Color, SceneLoadError> {
        Ok(Color::from(self.numbers::<3>(field)?))
    }
}
