use crate::{
    geometry::{Color, HitRecord, Ray, WorldVector},
    scene::{Light, Material, Object, is_occluded, nearest_hit},
};

/// Color returned for rays that don't hit anything.
pub fn background() -> Color {
    Color::zeros()
}

/// Phong shaded color seen along a ray, with hard shadows.
/// Every channel of the result is within [0, 1].
pub fn color_for_ray(ray: &Ray, lights: &[Light], objects: &[Object]) -> Color {
    let Some((object, hit)) = nearest_hit(ray, objects) else {
        return background();
    };

    let material = object.material();
    let view = -ray.direction.into_inner();

    let lit = lights
        .iter()
        .filter(|light| !is_occluded(objects, &hit.point, &light.position))
        .map(|light| light_contribution(material, &hit, &view, light))
        .sum::<Color>();

    clamp_color(lit + material.ambient())
}

/// Diffuse and specular term of a single (visible) light.
fn light_contribution(
    material: &Material,
    hit: &HitRecord,
    view: &WorldVector,
    light: &Light,
) -> Color {
    let light_direction = (light.position - hit.point).normalize();
    let normal_dot_light = light_direction.dot(&hit.normal);

    let diffuse = normal_dot_light.max(0.0);
    let reflected = hit.normal.as_ref() * (2.0 * normal_dot_light) - light_direction;
    let specular = reflected.dot(view).max(0.0).powf(material.shininess());

    light
        .color
        .component_mul(&(material.diffuse() * diffuse + material.specular() * specular))
}

/// Clamps all channels to [0, 1]. NaN channels become 0.
pub fn clamp_color(color: Color) -> Color {
    color.map(|x| x.max(0.0).min(1.0))
}
