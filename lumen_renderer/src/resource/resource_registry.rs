/// Central registry for renderer resources.
///
/// Stores geometries, shaders and materials in slot maps with stable
/// keys, plus a name index per resource type. Names are unique within a
/// type.

use rustc_hash::FxHashMap;
use slotmap::{Key, SlotMap};
use crate::error::{Error, Result};
use super::geometry::{Geometry, GeometryDesc, GeometryKey};
use super::material::{Material, MaterialDesc, MaterialKey, Pass, PassRef};
use super::shader::{Shader, ShaderDesc, ShaderKey};

/// Slot map plus name index for one resource type
struct NamedStore<K: Key, V> {
    items: SlotMap<K, V>,
    names: FxHashMap<String, K>,
}

impl<K: Key, V> NamedStore<K, V> {
    fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            names: FxHashMap::default(),
        }
    }

    fn insert(&mut self, kind: &str, name: String, value: V) -> Result<K> {
        if self.names.contains_key(&name) {
            let msg = format!("{} '{}' already exists", kind, name);
            crate::engine_error!("lumen::ResourceRegistry", "{}", msg);
            return Err(Error::InvalidResource(msg));
        }
        let key = self.items.insert(value);
        self.names.insert(name, key);
        Ok(key)
    }

    fn remove(&mut self, key: K) -> bool {
        if self.items.remove(key).is_some() {
            self.names.retain(|_, k| *k != key);
            true
        } else {
            false
        }
    }
}

pub struct ResourceRegistry {
    geometries: NamedStore<GeometryKey, Geometry>,
    shaders: NamedStore<ShaderKey, Shader>,
    materials: NamedStore<MaterialKey, Material>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            geometries: NamedStore::new(),
            shaders: NamedStore::new(),
            materials: NamedStore::new(),
        }
    }

    // ===== GEOMETRY =====

    pub fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryKey> {
        let name = desc.name.clone();
        let geometry = Geometry::from_desc(desc)?;
        self.geometries.insert("Geometry", name, geometry)
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.items.get(key)
    }

    pub fn geometry_by_name(&self, name: &str) -> Option<GeometryKey> {
        self.geometries.names.get(name).copied()
    }

    pub fn remove_geometry(&mut self, key: GeometryKey) -> bool {
        self.geometries.remove(key)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.items.len()
    }

    // ===== SHADER =====

    pub fn create_shader(&mut self, desc: ShaderDesc) -> Result<ShaderKey> {
        let name = desc.name.clone();
        let shader = Shader::from_desc(desc)?;
        self.shaders.insert("Shader", name, shader)
    }

    pub fn shader(&self, key: ShaderKey) -> Option<&Shader> {
        self.shaders.items.get(key)
    }

    pub fn shader_by_name(&self, name: &str) -> Option<ShaderKey> {
        self.shaders.names.get(name).copied()
    }

    pub fn remove_shader(&mut self, key: ShaderKey) -> bool {
        self.shaders.remove(key)
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.items.len()
    }

    // ===== MATERIAL =====

    /// Register a material. Every pass must name a registered shader.
    pub fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialKey> {
        if let Some(pass) = desc.passes.iter().find(|p| !self.shaders.items.contains_key(p.shader)) {
            let msg = format!(
                "Material '{}': {:?} pass references an unknown shader",
                desc.name, pass.pass_type
            );
            crate::engine_error!("lumen::ResourceRegistry", "{}", msg);
            return Err(Error::InvalidResource(msg));
        }

        let name = desc.name.clone();
        let material = Material::from_desc(desc)?;
        self.materials.insert("Material", name, material)
    }

    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.items.get(key)
    }

    pub fn material_by_name(&self, name: &str) -> Option<MaterialKey> {
        self.materials.names.get(name).copied()
    }

    pub fn remove_material(&mut self, key: MaterialKey) -> bool {
        self.materials.remove(key)
    }

    pub fn material_count(&self) -> usize {
        self.materials.items.len()
    }

    /// Resolve a pass reference
    pub fn pass(&self, pass_ref: PassRef) -> Option<&Pass> {
        self.material(pass_ref.material)?.pass(pass_ref.pass)
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_registry_tests.rs"]
mod tests;
