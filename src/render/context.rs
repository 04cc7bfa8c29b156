use tera::Context;

use crate::render::options::Options;

pub fn build_context(options: &Options) -> Context {
    let mut context = Context::new();
    for (key, value) in options {
        context.insert(key, value);
    }
    context
}
